#![no_main]

use libfuzzer_sys::fuzz_target;
use treesync::domain::value_objects::relative_path;
use treesync::PathFilter;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let mut parts = input.splitn(3, '\n');
        let include = parts.next().unwrap_or_default().to_string();
        let exclude = parts.next().unwrap_or_default().to_string();
        let path = parts.next().unwrap_or_default();

        if let Ok(filter) = PathFilter::validated(vec![include], vec![exclude]) {
            let _ = filter.accept(path);
        }
        if let Ok(normalized) = relative_path::normalize(path) {
            let _ = relative_path::ancestors(&normalized);
        }
    }
});
