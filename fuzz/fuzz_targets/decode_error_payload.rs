#![no_main]

use libfuzzer_sys::fuzz_target;
use wharf_validation::envelope::ValidationEnvelope;
use wharf_validation::taxonomy::TaxonomyVariant;
use wharf_validation::validation_error::build_error_registry;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let Ok(registry) = build_error_registry() else {
        return;
    };

    let code = u16::from_le_bytes([data[0], data[1]]);
    let Ok(payload) = std::str::from_utf8(&data[2..]) else {
        return;
    };

    // Decoding arbitrary input must never panic.
    let Ok(decoded) = registry.decode(code, payload) else {
        return;
    };

    // Rendering is total over decoded values.
    let _ = decoded.render();

    // Anything that decoded must survive its own re-encoding.
    let round_trip = registry
        .decode(decoded.raw_code(), &decoded.encode())
        .expect("re-encoded payload must decode");
    assert_eq!(round_trip, decoded);

    let envelope = ValidationEnvelope::seal(&decoded);
    if let Ok(json) = serde_json::to_string(&envelope)
        && let Ok(restored) = serde_json::from_str::<ValidationEnvelope>(&json)
    {
        let reopened = restored.open(&registry).expect("sealed envelope must reopen");
        assert_eq!(reopened, decoded);
    }
});
