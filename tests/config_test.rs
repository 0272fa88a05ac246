use guestfmt::{
    ArchType, Config, Endian, FormatArg, MappedMemory, OsUtils, StringStats, StringWidth,
    Verbosity,
};
use std::fs;
use test_log::test;

#[test]
fn test_os_utils_from_config_file() {
    let path = std::env::temp_dir().join(format!("guestfmt-config-{}.toml", std::process::id()));
    fs::write(
        &path,
        "arch = \"arm\"\nendian = \"big\"\nverbosity = \"disasm\"\n",
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    fs::remove_file(&path).unwrap();

    let mut utils =
        OsUtils::from_config(&config, MappedMemory::new(), StringStats::new(), Vec::new())
            .unwrap();
    assert_eq!(utils.arch.kind, ArchType::Arm);
    assert_eq!(utils.arch.endian(), Endian::Big);
    assert_eq!(utils.verbosity, Verbosity::Disasm);

    let mut args = vec![FormatArg::Int(7)];
    utils
        .printf("%03d", &mut args, StringWidth::Narrow)
        .unwrap();
    assert_eq!(utils.stdout, b"007");
}
