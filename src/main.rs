fn main() -> anyhow::Result<()> {
    reflect_ngin::run()
}
