use chrono::NaiveDate;
use serde_json::Value;
use wiifit_sync::{
    Activity, ActivityKind, Measurement, Profile, SaveData,
    sans::response::{VERSION, encode_error, encode_response},
};

fn measurement(weight_kg: f32, bmi: f32, balance_percent: f32) -> Measurement {
    Measurement {
        timestamp: NaiveDate::from_ymd_opt(2023, 5, 10)
            .unwrap()
            .and_hms_opt(23, 15, 0)
            .unwrap(),
        weight_kg,
        bmi,
        balance_percent,
        has_extended_data: false,
    }
}

fn profile(name: &str, measurements: Vec<Measurement>) -> Profile {
    Profile {
        name: name.into(),
        height_cm: 165,
        birth_year: 1990,
        birth_month: 5,
        birth_day: 10,
        measurements,
        activities: Vec::new(),
    }
}

fn encode(save: &SaveData, capacity: usize) -> Vec<u8> {
    let mut out = vec![0; capacity];
    let n = encode_response(save, &mut out);
    out.truncate(n);
    out
}

#[test]
fn exact_wire_text() {
    let save = SaveData {
        profiles: vec![profile("Alice", vec![measurement(65.3, 22.1, 51.0)])],
    };

    let text = String::from_utf8(encode(&save, 65536)).unwrap();

    assert_eq!(
        text,
        concat!(
            r#"{"version":2,"profiles":[{"name":"Alice","height_cm":165,"dob":"1990-05-10","#,
            r#""measurements":[{"date":"2023-05-10T23:15:00","weight_kg":65.3,"bmi":22.10,"#,
            r#""balance_percent":51.0}],"activities":[]}]}"#,
        )
    );
}

#[test]
fn parses_as_json() {
    let save = SaveData {
        profiles: vec![
            profile("Alice", vec![measurement(65.3, 22.1, 51.0), measurement(64.9, 21.95, 49.5)]),
            profile("Bob", Vec::new()),
        ],
    };

    let v: Value = serde_json::from_slice(&encode(&save, 65536)).unwrap();

    assert_eq!(v["version"], VERSION);
    assert_eq!(v["profiles"].as_array().unwrap().len(), 2);

    let alice = &v["profiles"][0];
    assert_eq!(alice["name"], "Alice");
    assert_eq!(alice["height_cm"], 165);
    assert_eq!(alice["dob"], "1990-05-10");
    assert_eq!(alice["activities"], Value::Array(Vec::new()));

    let m = &alice["measurements"][1];
    assert_eq!(m["date"], "2023-05-10T23:15:00");
    assert_eq!(m["weight_kg"].as_f64(), Some(64.9));
    assert_eq!(m["bmi"].as_f64(), Some(21.95));
    assert_eq!(m["balance_percent"].as_f64(), Some(49.5));
    assert!(m.get("has_extended_data").is_none());

    assert_eq!(v["profiles"][1]["measurements"], Value::Array(Vec::new()));
}

#[test]
fn names_are_escaped() {
    let name = "Al\"i\\ce\n\t";
    let save = SaveData {
        profiles: vec![profile(name, Vec::new())],
    };

    let v: Value = serde_json::from_slice(&encode(&save, 65536)).unwrap();

    assert_eq!(v["profiles"][0]["name"], name);
}

#[test]
fn non_finite_readings_are_replaced() {
    let save = SaveData {
        profiles: vec![profile(
            "Alice",
            vec![
                measurement(f32::NAN, f32::INFINITY, f32::NAN),
                measurement(-3.0, -1.0, -50.0),
            ],
        )],
    };

    let v: Value = serde_json::from_slice(&encode(&save, 65536)).unwrap();

    for m in v["profiles"][0]["measurements"].as_array().unwrap() {
        assert_eq!(m["weight_kg"].as_f64(), Some(0.0));
        assert_eq!(m["bmi"].as_f64(), Some(0.0));
        assert_eq!(m["balance_percent"].as_f64(), Some(50.0));
    }
}

#[test]
fn activities_are_rendered() {
    let mut p = profile("Alice", Vec::new());
    p.activities.push(Activity {
        timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(7, 30, 0)
            .unwrap(),
        kind: ActivityKind::Yoga,
        name: "Half-Moon".into(),
        duration_min: 12,
        calories: 40,
        score: 85,
    });
    let save = SaveData { profiles: vec![p] };

    let v: Value = serde_json::from_slice(&encode(&save, 65536)).unwrap();

    let a = &v["profiles"][0]["activities"][0];
    assert_eq!(a["date"], "2024-01-02T07:30:00");
    assert_eq!(a["type"], "yoga");
    assert_eq!(a["name"], "Half-Moon");
    assert_eq!(a["duration_min"], 12);
    assert_eq!(a["calories"], 40);
    assert_eq!(a["score"], 85);
}

#[test]
fn truncated_output_stays_balanced() {
    let save = SaveData {
        profiles: (0..3)
            .map(|i| profile(&format!("P{i}"), vec![measurement(70.0, 23.0, 50.0); 40]))
            .collect(),
    };

    let full = encode(&save, 65536);
    let full: Value = serde_json::from_slice(&full).unwrap();
    let full_profiles = full["profiles"].as_array().unwrap();

    for capacity in (13..2000).step_by(7).chain([4096, 8192]) {
        let out = encode(&save, capacity);
        assert!(out.len() <= capacity);

        let v: Value = serde_json::from_slice(&out)
            .unwrap_or_else(|e| panic!("capacity {capacity}: {e}: {}", String::from_utf8_lossy(&out)));

        assert_eq!(v["version"], VERSION);

        // Whatever survives is a prefix of the full response.
        if let Some(profiles) = v["profiles"].as_array() {
            for (p, full_p) in profiles.iter().zip(full_profiles) {
                assert_eq!(p["name"], full_p["name"]);
                if let Some(ms) = p["measurements"].as_array() {
                    assert!(ms.len() <= 40);
                    assert_eq!(ms.as_slice(), &full_p["measurements"].as_array().unwrap()[..ms.len()]);
                }
            }
        }
    }
}

#[test]
fn too_small_for_anything() {
    let save = SaveData {
        profiles: vec![profile("Alice", Vec::new())],
    };

    assert!(encode(&save, 0).is_empty());
    assert!(encode(&save, 12).is_empty());
    assert_eq!(encode(&save, 13), br#"{"version":2}"#);
}

#[test]
fn error_shape() {
    let mut out = [0; 256];
    let n = encode_error(-2, "Save file not found. Tried 12 paths, last: /x", &mut out);

    let v: Value = serde_json::from_slice(&out[..n]).unwrap();

    assert_eq!(v["version"], 2);
    assert_eq!(v["error"]["code"], -2);
    assert_eq!(v["error"]["message"], "Save file not found. Tried 12 paths, last: /x");
    assert!(v.get("profiles").is_none());
}

#[test]
fn error_encoding_is_repeatable() {
    let mut a = [0; 128];
    let mut b = [0xAA; 128];

    let n = encode_error(-4, "No profiles found in save file", &mut a);
    let m = encode_error(-4, "No profiles found in save file", &mut b);

    assert_eq!(&a[..n], &b[..m]);
}

#[test]
fn truncated_error_is_balanced() {
    let mut out = [0; 40];
    let n = encode_error(-3, &"x".repeat(100), &mut out);

    let v: Value = serde_json::from_slice(&out[..n]).unwrap();
    assert_eq!(v["error"]["code"], -3);
    assert!(v["error"].get("message").is_none());
}
