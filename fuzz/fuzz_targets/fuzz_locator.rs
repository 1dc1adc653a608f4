#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(endpoint) = treesync::Endpoint::parse(input) {
            // Display must not panic on anything parse accepted
            let _ = endpoint.to_string();
            let _ = endpoint.locator().requires_delegate();
        }
    }
});
