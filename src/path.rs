use crate::classify::strip_one;

/// Normalize a Windows style path copied from Explorer.
///
/// Backslashes become forward slashes. With `posix_mode` a drive path is
/// mapped onto its `/mnt/<drive>` mount point. The result is wrapped in a
/// single pair of double quotes only when it contains a space.
pub fn normalize_path(input: &str, posix_mode: bool) -> String {
    let clean = strip_one(strip_one(input, '"'), '\'');
    let mut clean = clean.replace('\\', "/");

    if posix_mode {
        let mut chars = clean.chars();
        if let (Some(drive), Some(':')) = (chars.next(), chars.next()) {
            let remainder = chars.as_str();
            let sep = if remainder.starts_with('/') { "" } else { "/" };
            clean = format!("/mnt/{}{sep}{remainder}", drive.to_lowercase());
        }
    }

    if clean.contains(' ') {
        format!("\"{clean}\"")
    } else {
        clean
    }
}

#[test]
fn test_normalize_path() {
    assert_eq!(normalize_path(r"C:\Users\a b", true), "\"/mnt/c/Users/a b\"");
    assert_eq!(normalize_path(r"C:\Users\a b", false), "\"C:/Users/a b\"");
    assert_eq!(normalize_path(r"C:\Users\ab", false), "C:/Users/ab");
    assert_eq!(normalize_path(r#""D:\Work\x.txt""#, true), "/mnt/d/Work/x.txt");
    assert_eq!(normalize_path(r"'E:\dir'", false), "E:/dir");
    // no separator after the drive
    assert_eq!(normalize_path("C:foo", true), "/mnt/c/foo");
    assert_eq!(normalize_path("C:", true), "/mnt/c/");
    // UNC paths have no drive to map
    assert_eq!(
        normalize_path(r"\\server\share\a", true),
        "//server/share/a"
    );
}
