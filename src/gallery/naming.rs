use rand::Rng;

const TOKEN_LEN: usize = 12;
const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";
const PLACEHOLDER: char = '_';

/// Builds a storage name of the form `<12 hex chars>_<sanitized original>`.
///
/// Every character of the original outside `[A-Za-z0-9._-]` becomes `_`, so the
/// result is safe as a single path component and as a URL segment. The random
/// token only guards against collisions; it is not meant to be unguessable.
pub fn allocate_storage_name(original_filename: &str) -> String {
    let mut rng = rand::rng();
    let mut name = String::with_capacity(TOKEN_LEN + 1 + original_filename.len());

    for _ in 0..TOKEN_LEN {
        name.push(HEX_DIGITS[rng.random_range(0..HEX_DIGITS.len())] as char);
    }
    name.push('_');
    name.extend(original_filename.chars().map(sanitize_char));

    name
}

fn sanitize_char(c: char) -> char {
    if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
        c
    } else {
        PLACEHOLDER
    }
}

/// Ensures a storage name carries an extension the catalog lists.
///
/// Names that already end in an accepted extension are kept as they are. Otherwise the
/// canonical extension for the sniffed type is appended; `None` means the content is
/// an image kind the catalog does not serve.
pub fn with_image_extension(storage_name: String, content_type: &str) -> Option<String> {
    if super::is_image(&storage_name) {
        return Some(storage_name);
    }

    let extension = match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => return None,
    };

    Some(format!("{}.{}", storage_name, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_safe(name: &str) {
        assert!(name.len() >= TOKEN_LEN + 1, "too short: {}", name);
        assert!(
            name.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')),
            "unsafe characters in {}",
            name
        );
        let (token, rest) = name.split_at(TOKEN_LEN);
        assert!(token.bytes().all(|b| HEX_DIGITS.contains(&b)));
        assert!(rest.starts_with('_'));
    }

    #[test]
    fn test_special_characters_are_replaced() {
        let name = allocate_storage_name("photo!.png");
        assert_safe(&name);
        assert_eq!(&name[TOKEN_LEN..], "_photo_.png");
    }

    #[test]
    fn test_path_separators_never_survive() {
        for original in ["../../etc/passwd", "a\\b.jpg", "dir/sub/pic.gif", "naïve café.jpg"] {
            let name = allocate_storage_name(original);
            assert_safe(&name);
            assert!(!name.contains('/'));
            assert!(!name.contains('\\'));
        }
        let name = allocate_storage_name("naïve café.jpg");
        assert_eq!(&name[TOKEN_LEN..], "_na_ve_caf_.jpg");
    }

    #[test]
    fn test_empty_filename_still_yields_a_name() {
        let name = allocate_storage_name("");
        assert_eq!(name.len(), TOKEN_LEN + 1);
        assert_safe(&name);
    }

    #[test]
    fn test_allocations_differ() {
        let first = allocate_storage_name("same.jpg");
        let second = allocate_storage_name("same.jpg");
        assert_ne!(first, second);
    }

    #[test]
    fn test_with_image_extension() {
        assert_eq!(
            with_image_extension("abc_photo.PNG".to_string(), "image/jpeg").as_deref(),
            Some("abc_photo.PNG")
        );
        assert_eq!(
            with_image_extension("abc_photo".to_string(), "image/png").as_deref(),
            Some("abc_photo.png")
        );
        assert_eq!(
            with_image_extension("abc_".to_string(), "image/jpeg").as_deref(),
            Some("abc_.jpg")
        );
        assert_eq!(with_image_extension("abc_scan.bmp".to_string(), "image/bmp"), None);
    }
}
