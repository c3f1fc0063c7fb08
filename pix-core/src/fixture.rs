//! Helpers for loading fixtures in tests.
//!
//! Fixtures live in `src/fixtures` relative to the manifest directory of the crate running the test.
pub fn read_fixture(name: &str) -> anyhow::Result<String> {
    let base_dir = std::env::var("CARGO_MANIFEST_DIR")?;
    let raw = std::fs::read_to_string(format!("{base_dir}/src/fixtures/{name}"))?;
    Ok(raw.trim().to_string())
}

pub fn read_fixture_as<T>(name: &str) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    Ok(serde_json::from_str::<T>(&read_fixture(name)?)?)
}
