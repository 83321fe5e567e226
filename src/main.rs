fn main() -> anyhow::Result<()> {
    chartnav_lib::run()
}
