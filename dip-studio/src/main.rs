fn main() -> anyhow::Result<()> {
    extern crate dip_studio;

    dip_studio::desktop_main()
}
