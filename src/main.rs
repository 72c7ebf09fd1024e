fn main() -> anyhow::Result<()> {
    codecrafter_lib::run()
}
