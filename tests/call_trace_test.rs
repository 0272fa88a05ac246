//! Invocation traces for hooked calls

use guestfmt::{
    stringify, update_ellipsis, Arch, ArchType, MappedMemory, OsUtils, ReturnValue, StringStats,
    Verbosity, ELLIPSIS_PREF,
};
use indexmap::IndexMap;
use test_log::test;

fn utils(arch: ArchType, verbosity: Verbosity) -> OsUtils<MappedMemory, StringStats, Vec<u8>> {
    OsUtils::new(MappedMemory::new(), Arch::new(arch), StringStats::new(), Vec::new())
        .with_verbosity(verbosity)
}

#[test]
fn test_strcpy_trace_below_debug() {
    let utils = utils(ArchType::X8664, Verbosity::Default);
    let args = [("dst", "0x2000"), ("__qlva_0", "0x3000")];

    assert_eq!(
        utils.render_call(0x4010, "hook_strcpy", &args, None, false),
        "strcpy(dst = 0x2000, 0x3000)"
    );
    assert_eq!(
        utils.render_call(0x4010, "hook_strcpy", &args, Some(&ReturnValue::Int(5)), false),
        "strcpy(dst = 0x2000, 0x3000) = 0x5"
    );
    assert_eq!(
        utils.render_call(0x4010, "hook_strcpy", &args, None, true),
        "strcpy(dst = 0x2000, 0x3000) (PASSTHRU)"
    );
}

#[test]
fn test_trace_at_debug_has_address_prefix() {
    let utils = utils(ArchType::Arm, Verbosity::Debug);
    let args = [("fd", "0x1")];

    let line = utils.print_function(
        0x10474,
        "hook_close",
        &args,
        Some(&ReturnValue::Int(0)),
        true,
    );
    assert_eq!(line, "0x00010474: close(fd = 0x1) = 0x0 (PASSTHRU)");
}

#[test]
fn test_print_function_when_disabled_still_renders() {
    let utils = utils(ArchType::X86, Verbosity::Disabled);
    let args = [("code", "0x0")];
    assert_eq!(
        utils.print_function(0, "hook_exit", &args, None, false),
        "exit(code = 0x0)"
    );
}

#[test]
fn test_variadic_printf_trace() {
    let utils = utils(ArchType::X86, Verbosity::Default);

    // Declared params first, then the synthetic names for the varargs
    let mut params: IndexMap<String, String> = IndexMap::new();
    params.insert("format".to_string(), stringify("%s=%d\n"));
    update_ellipsis(
        &mut params,
        &[stringify("answer"), "0x2a".to_string()],
    );
    assert!(params.keys().skip(1).all(|k| k.starts_with(ELLIPSIS_PREF)));

    let pairs: Vec<(String, String)> = params.into_iter().collect();
    let ret = ReturnValue::from(10u64);
    assert_eq!(
        utils.render_call(0x8048000, "hook_printf", &pairs, Some(&ret), false),
        "printf(format = \"%s=%d\\n\", \"answer\", 0x2a) = 0xa"
    );
}
