fn main() -> anyhow::Result<()> {
    quadbench_cli::run()
}
