use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

/// Resolves a vague user reference ("image 1", "1st xray", "img10") to an
/// on-disk path. Pure besides filesystem existence checks:
/// 1. the cleaned input itself, if it exists;
/// 2. the input joined under `image_dir`, if that exists;
/// 3. the first embedded integer tried against a fixed list of filename
///    patterns under `image_dir`;
/// 4. otherwise the cleaned input unchanged, so the caller surfaces a
///    not-found error naming what the user typed.
pub fn resolve_image_reference(user_input: &str, image_dir: &Path) -> PathBuf {
    lazy_static! {
        static ref DIGITS_RE: Regex = Regex::new(r"\d+").unwrap();
    }

    let clean = user_input.trim().trim_matches(|c| c == '"' || c == '\'');

    let clean_path = PathBuf::from(clean);
    if clean_path.exists() {
        return clean_path;
    }

    let direct = image_dir.join(clean);
    if direct.exists() {
        return direct;
    }

    if let Some(m) = DIGITS_RE.find(clean) {
        let n = m.as_str();
        let candidates = [
            format!("img{n}.jpg"),
            format!("image{n}.jpg"),
            format!("{n}.jpg"),
            format!("img{n}.png"),
        ];
        for name in candidates {
            let candidate = image_dir.join(&name);
            if candidate.exists() {
                return candidate;
            }
        }
    }

    clean_path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vague_references_resolve_to_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let img1 = dir.path().join("img1.jpg");
        std::fs::write(&img1, b"jpeg").unwrap();

        for input in ["image 1", "1st xray", "img1", " \"img 1\" "] {
            assert_eq!(resolve_image_reference(input, dir.path()), img1, "{input}");
        }
    }

    #[test]
    fn existing_path_wins_over_patterns() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("img2.jpg"), b"jpeg").unwrap();
        let exact = dir.path().join("scan 2.png");
        std::fs::write(&exact, b"png").unwrap();

        assert_eq!(
            resolve_image_reference(exact.to_str().unwrap(), dir.path()),
            exact
        );
        // joined under the directory also beats digit extraction
        assert_eq!(resolve_image_reference("scan 2.png", dir.path()), exact);
    }

    #[test]
    fn pattern_order_is_fixed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("3.jpg"), b"jpeg").unwrap();
        std::fs::write(dir.path().join("img3.png"), b"png").unwrap();

        // img3.jpg and image3.jpg are missing, so "{n}.jpg" comes first
        assert_eq!(
            resolve_image_reference("xray 3", dir.path()),
            dir.path().join("3.jpg")
        );
    }

    #[test]
    fn unresolvable_input_returned_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve_image_reference("no such thing", dir.path()),
            PathBuf::from("no such thing")
        );
    }
}
