#![no_main]

use forum_markup::formatter::Formatter;
use libfuzzer_sys::fuzz_target;

const CHARSETS: &[Option<&str>] = &[
    None,
    Some("utf-8"),
    Some("windows-1252"),
    Some("shift_jis"),
    Some("text/plain; charset=utf-16le"),
];

fuzz_target!(|data: &[u8]| {
    let Some((&selector, body)) = data.split_first() else {
        return;
    };
    let charset = CHARSETS[selector as usize % CHARSETS.len()];

    let formatter = Formatter::default();
    let _ = formatter.format_bytes(body, charset);
});
