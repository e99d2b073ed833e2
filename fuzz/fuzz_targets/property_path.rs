#![no_main]

use libfuzzer_sys::fuzz_target;
use propscope::property::PropertyPath;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(path) = PropertyPath::parse(text) {
            // Segments re-escape quoted tokens when displayed
            let rendered = path
                .segments()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(".");
            let reparsed = PropertyPath::parse(&rendered).expect("rendered path parses");
            assert_eq!(path.segments(), reparsed.segments());
        }
    }
});
