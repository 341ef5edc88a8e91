/// Derives the URL slug for a name: lowercased, with each space replaced by
/// an underscore.
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}
