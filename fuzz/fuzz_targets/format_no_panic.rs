#![no_main]

use forum_markup::format_for_display;
use forum_markup::policy::FORUM_TAGS;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let Ok(html) = format_for_display(text) else {
        return;
    };

    // Text is escaped, so every '<' left in the output opens a tag.
    for tag in html.split('<').skip(1) {
        let name: String = tag
            .trim_start_matches('/')
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect();
        assert!(FORUM_TAGS.contains(&name.as_str()), "tag leaked: {name}");
    }

    // Formatting its own output must not panic either.
    let _ = format_for_display(&html);
});
