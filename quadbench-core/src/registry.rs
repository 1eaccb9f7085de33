//! Integrand Registry
//!
//! Isolated workers cannot receive closures, so every integrand is a
//! named, link-time-registered function. Tasks carry the name over the
//! wire; each process resolves it against its own copy of this
//! registry.

/// A named integrand addressable from any execution strategy.
#[derive(Debug, Clone)]
pub struct IntegrandDef {
    /// Registry name, unique, stable across processes.
    pub name: &'static str,
    /// One-line description for `quadbench list`.
    pub description: &'static str,
    /// The function itself. A plain fn pointer: no captured state.
    pub eval: fn(f64) -> f64,
}

inventory::collect!(IntegrandDef);

/// Look up an integrand by registry name.
pub fn find_integrand(name: &str) -> Option<&'static IntegrandDef> {
    inventory::iter::<IntegrandDef>
        .into_iter()
        .find(|def| def.name == name)
}

/// All registered integrands, sorted by name.
pub fn registered_integrands() -> Vec<&'static IntegrandDef> {
    let mut defs: Vec<_> = inventory::iter::<IntegrandDef>.into_iter().collect();
    defs.sort_by_key(|def| def.name);
    defs
}

// Built-in integrands. Downstream crates may register their own with
// the same `inventory::submit!` pattern.

inventory::submit! {
    IntegrandDef { name: "cos", description: "cosine", eval: f64::cos }
}

inventory::submit! {
    IntegrandDef { name: "sin", description: "sine", eval: f64::sin }
}

inventory::submit! {
    IntegrandDef { name: "exp", description: "natural exponential", eval: f64::exp }
}

inventory::submit! {
    IntegrandDef { name: "square", description: "x squared", eval: square }
}

inventory::submit! {
    IntegrandDef { name: "unit", description: "constant 1", eval: unit }
}

fn square(x: f64) -> f64 {
    x * x
}

fn unit(_x: f64) -> f64 {
    1.0
}

/// Anchor to prevent LTO from stripping registry entries.
#[used]
#[doc(hidden)]
pub static REGISTRY_ANCHOR: fn() = || {
    for _ in inventory::iter::<IntegrandDef> {}
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_resolve_by_name() {
        for name in ["cos", "sin", "exp", "square", "unit"] {
            let def = find_integrand(name);
            assert!(def.is_some(), "missing builtin: {name}");
        }
    }

    #[test]
    fn unknown_name_resolves_to_none() {
        assert!(find_integrand("tan").is_none());
        assert!(find_integrand("").is_none());
    }

    #[test]
    fn lookup_evaluates_the_right_function() {
        let square = find_integrand("square").unwrap();
        assert_eq!((square.eval)(3.0), 9.0);

        let unit = find_integrand("unit").unwrap();
        assert_eq!((unit.eval)(123.0), 1.0);
    }

    #[test]
    fn listing_is_sorted_and_complete() {
        let names: Vec<_> = registered_integrands()
            .iter()
            .map(|def| def.name)
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(names.contains(&"cos"));
    }
}
