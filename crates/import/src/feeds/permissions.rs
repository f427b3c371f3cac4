use crate::feeds::error::Result;
use crate::feeds::for_each_row;
use relidx_model::Permissions;
use std::path::Path;

/// Build the permissions index from `06perms.txt` and
/// `02packages.details.txt.gz`.
///
/// A feed that is missing or unreadable contributes nothing; the other one is
/// still used.
pub(crate) fn load(perms: &Path, packages: &Path) -> Permissions {
    let mut permissions = Permissions::new();
    for (path, parse) in [(perms, parse_perms as RowParser), (packages, parse_packages as RowParser)] {
        match read(path, parse) {
            Ok(pairs) => {
                tracing::debug!(feed = %path.display(), entries = pairs.len(), "Loaded permissions feed");
                for (module, author) in pairs {
                    permissions.insert(module, author);
                }
            },
            Err(error) => tracing::warn!(feed = %path.display(), error = %error, "Ignoring permissions feed"),
        }
    }
    permissions
}

type RowParser = fn(&str) -> Option<(String, String)>;

/// All pairs of a feed, or nothing at all if it can't be read to the end.
fn read(path: &Path, parse: RowParser) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for_each_row(path, |row| match parse(row) {
        Some(pair) => pairs.push(pair),
        None => tracing::trace!(row, "Malformed feed row"),
    })?;
    Ok(pairs)
}

/// `module,userid,permission`
fn parse_perms(row: &str) -> Option<(String, String)> {
    let mut fields = row.split(',').map(str::trim);
    let module = fields.next().filter(|f| !f.is_empty())?;
    let author = fields.next().filter(|f| !f.is_empty())?;
    Some((module.to_string(), author.to_uppercase()))
}

/// `package version A/AU/AUTHOR/file`
fn parse_packages(row: &str) -> Option<(String, String)> {
    let mut fields = row.split_whitespace();
    let package = fields.next()?;
    let pathname = fields.nth(1)?;
    let author = pathname.split('/').nth(2).filter(|a| !a.is_empty())?;
    Some((package.to_string(), author.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::feed;
    use relidx_compress::Compression;
    use rstest::rstest;

    #[rstest]
    #[case("Foo::Bar,ABC,f", Some(("Foo::Bar", "ABC")))]
    #[case("Foo::Bar,abc,c", Some(("Foo::Bar", "ABC")))]
    #[case("Foo::Bar", None)]
    #[case(",ABC,f", None)]
    fn test_parse_perms(#[case] row: &str, #[case] expected: Option<(&str, &str)>) {
        let expected = expected.map(|(m, a)| (m.to_string(), a.to_string()));
        assert_eq!(parse_perms(row), expected);
    }

    #[rstest]
    #[case("Foo::Bar   1.23  A/AB/ABC/Foo-Bar-1.23.tar.gz", Some(("Foo::Bar", "ABC")))]
    #[case("Foo::Bar   undef X/XY/XYZ/sub/Foo-1.0.tgz", Some(("Foo::Bar", "XYZ")))]
    #[case("Foo::Bar   1.23", None)]
    #[case("Foo::Bar   1.23  Foo-Bar-1.23.tar.gz", None)]
    fn test_parse_packages(#[case] row: &str, #[case] expected: Option<(&str, &str)>) {
        let expected = expected.map(|(m, a)| (m.to_string(), a.to_string()));
        assert_eq!(parse_packages(row), expected);
    }

    #[test]
    fn test_load_merges_both_feeds() {
        let dir = tempfile::tempdir().unwrap();
        let perms = dir.path().join("06perms.txt");
        let packages = dir.path().join("02packages.details.txt.gz");
        feed(&perms, Compression::None, &["Foo,ABC,f", "Foo,XYZ,c"]);
        feed(&packages, Compression::Gzip, &["Bar  1.0  O/OT/OTHER/Bar-1.0.tar.gz"]);

        let permissions = load(&perms, &packages);
        assert_eq!(permissions.len(), 2);
        assert!(permissions.is_authorized("Foo", "XYZ"));
        assert!(!permissions.is_authorized("Bar", "ABC"));
        assert!(permissions.is_authorized("Unclaimed", "ABC"));
    }

    #[test]
    fn test_header_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let perms = dir.path().join("06perms.txt");
        std::fs::write(&perms, "File: 06perms.txt\nDescription: x,y,z\n\nFoo,ABC,f\n").unwrap();
        let permissions = load(&perms, &dir.path().join("missing.gz"));
        assert_eq!(permissions.len(), 1);
        assert!(permissions.authors("Description: x").is_none());
    }

    #[test]
    fn test_missing_feeds_contribute_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let permissions = load(&dir.path().join("06perms.txt"), &dir.path().join("02packages.details.txt.gz"));
        assert!(permissions.is_empty());
    }

    #[test]
    fn test_corrupt_feed_contributes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let packages = dir.path().join("02packages.details.txt.gz");
        let mut body = Compression::Gzip.compress(b"File: x\n\nFoo 1.0 A/AB/ABC/Foo-1.0.tar.gz\n").unwrap();
        body.truncate(body.len() / 2);
        std::fs::write(&packages, body).unwrap();
        let permissions = load(&dir.path().join("06perms.txt"), &packages);
        assert!(permissions.is_empty());
    }
}
