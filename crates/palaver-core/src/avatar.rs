/// Built-in default avatars, keyed by id and addressed by content hash.
pub const DEFAULT_AVATARS: [(&str, &str); 6] = [
    ("0", "1f0bfc0865d324c2587920a7d80c609b"),
    ("1", "c09a43a372ba81e3018c3151d4ed4773"),
    ("2", "7c8f476123d28d103efe381543274c25"),
    ("3", "6f26ddd1bf59740c536d2274bb834a05"),
    ("4", "3c6ccb83716d1e4fb91d3082f6b21d77"),
    ("5", "4c1b599b1ef5b9f1874fdb9933f3e03b"),
];

/// Cache directive for content-addressed assets (one year).
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000";

/// Drop everything from the first `.` onwards, so `"3.png"` becomes `"3"`.
pub fn strip_extension(id: &str) -> &str {
    match id.find('.') {
        Some(idx) => &id[..idx],
        None => id,
    }
}

/// Look up the content hash for a default avatar id. Extensions are ignored.
pub fn default_avatar_hash(id: &str) -> Option<&'static str> {
    let id = strip_extension(id);
    DEFAULT_AVATARS
        .iter()
        .find(|(key, _)| *key == id)
        .map(|(_, hash)| *hash)
}
