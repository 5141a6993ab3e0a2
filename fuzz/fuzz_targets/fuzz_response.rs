// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use libfuzzer_sys::fuzz_target;
use predictor::prediction::PredictResponse;
use predictor::render;

fuzz_target!(|data: &[u8]| {
    // Any body must either parse into entries or fail as a transport error.
    match PredictResponse::from_slice(data) {
        Ok(response) => {
            let entries = response.into_entries();
            let _ = render::list_html(&entries);
        }
        Err(e) => assert!(e.is_transport_failure()),
    }
});
