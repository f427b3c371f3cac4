use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Every archive format that has ever been uploaded in meaningful numbers.
regex!(ARCHIVE_EXTENSION_REGEX, r"\.(?:tgz|tbz|tar[._-]gz|tar\.bz2|tar\.Z|zip|7z)$");
// `.../authors/id/A/AU/AUTHOR/rest` (the `authors/` part is optional).
regex!(AUTHOR_ID_REGEX, r"(?:^|/)(?:authors/)?id/([A-Z])/([A-Z0-9][A-Z0-9-])/([A-Z0-9][A-Z0-9-]*)/(.+)$");
// A bare pathname relative to `authors/id/`, as used in `02packages`.
regex!(PATHNAME_REGEX, r"^([A-Z])/([A-Z0-9][A-Z0-9-])/([A-Z0-9][A-Z0-9-]*)/(.+)$");
