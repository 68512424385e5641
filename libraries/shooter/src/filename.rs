/// Splits `name` into its stem and extension at the last dot of its final component.
/// The extension is returned without the dot.
pub(crate) fn split_extension(name: &str) -> (&str, Option<&str>) {
    let component_start = name.rfind(['/', '\\']).map_or(0, |i| i + 1);
    match name[component_start..].rfind('.') {
        Some(dot) => {
            let dot = component_start + dot;
            (&name[..dot], Some(&name[dot + 1..]))
        }
        None => (name, None),
    }
}

/// `Film.srt` with `n = 2` becomes `Film-2.srt`.
pub(crate) fn with_suffix(name: &str, n: u32) -> String {
    match split_extension(name) {
        (stem, Some(ext)) => format!("{stem}-{n}.{ext}"),
        (stem, None) => format!("{stem}-{n}"),
    }
}
