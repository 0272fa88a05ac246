//! End-to-end: a hooked sprintf/printf as an emulator would drive it

use guestfmt::{
    read_string, Arch, ArchType, Endian, FormatArg, FormatError, GuestMemory, MappedMemory,
    OsUtils, StringStats, StringWidth, Terminator,
};
use test_log::test;

const STRINGS: u64 = 0x40_0000;
const STACK: u64 = 0x7ff0_0000;
const HEAP: u64 = 0x10_0000;

fn process(arch: Arch) -> OsUtils<MappedMemory, StringStats, Vec<u8>> {
    let mut mem = MappedMemory::new();
    mem.map(STRINGS, 0x1000, ".rodata").unwrap();
    mem.map(STACK, 0x1000, "[stack]").unwrap();
    mem.map(HEAP, 0x1000, "[heap]").unwrap();
    OsUtils::new(mem, arch, StringStats::new(), Vec::new())
}

fn put(utils: &mut OsUtils<MappedMemory, StringStats, Vec<u8>>, at: u64, text: &str, width: StringWidth) {
    utils.mem.write(at, &width.encode_terminated(text)).unwrap();
}

fn push_args(utils: &mut OsUtils<MappedMemory, StringStats, Vec<u8>>, values: &[u64]) {
    let arch = utils.arch;
    for (i, v) in values.iter().enumerate() {
        utils
            .mem
            .write_ptr(STACK + (i * arch.pointer_size()) as u64, *v, &arch)
            .unwrap();
    }
}

#[test]
fn test_guest_sprintf_from_va_list() {
    let mut utils = process(Arch::new(ArchType::X8664));
    put(&mut utils, STRINGS, "user=%s uid=%d home=%p", StringWidth::Narrow);
    put(&mut utils, STRINGS + 0x100, "root", StringWidth::Narrow);
    push_args(&mut utils, &[STRINGS + 0x100, 0, 0x7fff_1000]);

    // The hook reads the format itself, then marshals the rest off the stack
    let format = utils.read_cstring(STRINGS).unwrap();
    let mut args = utils.va_list(&format, STACK).unwrap();
    assert_eq!(args.len(), 3);

    let written = utils
        .sprintf(HEAP, &format, &mut args, StringWidth::Narrow)
        .unwrap();

    let expected = "user=root uid=0 home=0x7fff1000";
    assert_eq!(written, expected.len());
    assert_eq!(
        read_string(&utils.mem, HEAP, Terminator::Narrow).unwrap(),
        expected
    );
    assert_eq!(utils.stats.count("root"), 1);
    assert_eq!(utils.stats.count("user=%s uid=%d home=%p"), 1);
}

#[test]
fn test_guest_wsprintf_on_32bit() {
    let mut utils = process(Arch::new(ArchType::X86));
    put(&mut utils, STRINGS, "kernel32.dll", StringWidth::Wide);
    push_args(&mut utils, &[STRINGS, 0xdeadbeef]);

    let mut args = utils.va_list("%s @ %08X", STACK).unwrap();
    let written = utils
        .sprintf(HEAP, "%s @ %08X", &mut args, StringWidth::Wide)
        .unwrap();

    assert_eq!(written, 23);
    assert_eq!(utils.read_wstring(HEAP).unwrap(), "kernel32.dll @ DEADBEEF");
}

#[test]
fn test_big_endian_guest_va_list() {
    let mut utils = process(Arch::with_endian(ArchType::Mips, Endian::Big));
    utils.mem.write(STACK, &[0x00, 0x00, 0x01, 0x00]).unwrap();

    let mut args = utils.va_list("%d", STACK).unwrap();
    assert_eq!(args, vec![FormatArg::Int(256)]);

    utils
        .printf("%d\n", &mut args, StringWidth::Narrow)
        .unwrap();
    assert_eq!(utils.stdout, b"256\n");
}

#[test]
fn test_unterminated_guest_string_aborts_the_call() {
    let mut utils = process(Arch::new(ArchType::X8664));
    // Fill the whole region so the scan runs off the end
    utils.mem.write(STRINGS, &[b'A'; 0x1000]).unwrap();

    let mut args = vec![FormatArg::Int(STRINGS)];
    let err = utils
        .printf("%s", &mut args, StringWidth::Narrow)
        .unwrap_err();

    assert!(matches!(err, FormatError::Memory(_)));
    assert!(utils.stdout.is_empty());
}

#[test]
fn test_negative_star_width_from_32bit_guest() {
    let mut utils = process(Arch::new(ArchType::X86));
    push_args(&mut utils, &[(-5i32) as u32 as u64, 42]);

    let mut args = utils.va_list("[%*d]", STACK).unwrap();
    assert_eq!(args[0], FormatArg::Int(0xffff_fffb));

    utils
        .printf("[%*d]", &mut args, StringWidth::Narrow)
        .unwrap();
    assert_eq!(utils.stdout, b"[42   ]");
}

#[test]
fn test_huge_width_is_reported_not_allocated() {
    let mut utils = process(Arch::new(ArchType::X8664));
    push_args(&mut utils, &[0x7fff_ffff_ffff_ffff, 1]);

    let mut args = utils.va_list("%*d", STACK).unwrap();
    let err = utils
        .printf("%*d", &mut args, StringWidth::Narrow)
        .unwrap_err();

    assert!(matches!(err, FormatError::WidthTooBig));
    assert!(utils.stdout.is_empty());
}
