// src/github/validate.rs
// =============================================================================
// Input validation for repository names and git refs.
//
// These checks run before anything is interpolated into an API endpoint, so a
// name like "../../user" can never reach GitHub as a different path.
// =============================================================================

// Characters git refuses in ref names (see `git check-ref-format`)
const REF_FORBIDDEN_CHARS: &[char] = &['~', '^', ':', '?', '*', '[', ']', '\\'];
const REF_FORBIDDEN_SEQUENCES: &[&str] = &["..", "@{", "//"];

// Characters that would end the path part of an endpoint URL or smuggle an
// encoded one into it
const PATH_FORBIDDEN_CHARS: &[char] = &['?', '#', '%', '\\'];

// GitHub allows alphanumerics, '-', '_' and '.' in owner and repo names.
// "." and ".." are dot segments and would be resolved away in the URL.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

// Validates an `owner/repo` string
//
// Returns: Ok(()) or the message shown to the user
//
// Example:
//   "rust-lang/rust" -> Ok(())
//   "../rate_limit"  -> Err("Repository contains invalid characters")
pub fn validate_repository_input(input: &str) -> Result<(), String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("Repository input is required".to_string());
    }

    let parts: Vec<&str> = trimmed.split('/').collect();
    if parts.len() != 2 {
        return Err("Repository must be in \"owner/repo\" format".to_string());
    }

    let (owner, repo) = (parts[0], parts[1]);
    if owner.is_empty() {
        return Err("Owner cannot be empty".to_string());
    }
    if repo.is_empty() {
        return Err("Repository name cannot be empty".to_string());
    }
    if !is_valid_name(owner) || !is_valid_name(repo) {
        return Err("Repository contains invalid characters".to_string());
    }

    Ok(())
}

/// Validates an optional branch/tag/commit ref; blank input is accepted
pub fn validate_ref_input(input: &str) -> Result<(), String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(());
    }

    let bad_char = trimmed
        .chars()
        .any(|c| c.is_whitespace() || REF_FORBIDDEN_CHARS.contains(&c));
    let bad_sequence = REF_FORBIDDEN_SEQUENCES.iter().any(|s| trimmed.contains(s));
    if bad_char || bad_sequence {
        return Err("Branch/ref contains invalid characters".to_string());
    }

    if trimmed.starts_with('.') || trimmed.ends_with(".lock") {
        return Err("Invalid branch/ref format".to_string());
    }

    Ok(())
}

/// Validates a repository-relative file path before it is put into a
/// contents endpoint
pub fn validate_file_path(path: &str) -> Result<(), String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err("File path is required".to_string());
    }

    // Leading '/' or any dot segment could step out of /contents/
    let escapes = trimmed.starts_with('/')
        || trimmed.split('/').any(|seg| seg == ".." || seg == ".");
    let bad_char = trimmed
        .chars()
        .any(|c| c.is_control() || PATH_FORBIDDEN_CHARS.contains(&c));
    if escapes || bad_char {
        return Err(format!("Invalid file path: {trimmed}"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_repository_input() {
        assert!(validate_repository_input("rust-lang/rust").is_ok());
        assert!(validate_repository_input("  octo_cat/hello.world  ").is_ok());
    }

    #[test]
    fn test_invalid_repository_input() {
        assert_eq!(
            validate_repository_input("   ").unwrap_err(),
            "Repository input is required"
        );
        assert_eq!(
            validate_repository_input("just-a-name").unwrap_err(),
            "Repository must be in \"owner/repo\" format"
        );
        assert_eq!(
            validate_repository_input("/repo").unwrap_err(),
            "Owner cannot be empty"
        );
        assert_eq!(
            validate_repository_input("owner/").unwrap_err(),
            "Repository name cannot be empty"
        );
        assert_eq!(
            validate_repository_input("own er/repo").unwrap_err(),
            "Repository contains invalid characters"
        );
        assert!(validate_repository_input("../etc/passwd").is_err());
    }

    #[test]
    fn test_dot_segments_are_not_names() {
        assert!(validate_repository_input("../rate_limit").is_err());
        assert!(validate_repository_input("./docs").is_err());
        assert!(validate_repository_input("octo/..").is_err());
        // dots inside a name are fine
        assert!(validate_repository_input("octo/.github").is_ok());
        assert!(validate_repository_input("octo/...").is_ok());
    }

    #[test]
    fn test_file_path_validation() {
        assert!(validate_file_path("README.md").is_ok());
        assert!(validate_file_path("docs/guide/intro.md").is_ok());
        assert!(validate_file_path("docs/.vitepress/config.md").is_ok());

        assert!(validate_file_path("").is_err());
        assert!(validate_file_path("/etc/passwd").is_err());
        assert!(validate_file_path("docs/../../rate_limit").is_err());
        assert!(validate_file_path("./README.md").is_err());
        assert_eq!(
            validate_file_path("README.md?ref=evil").unwrap_err(),
            "Invalid file path: README.md?ref=evil"
        );
        assert!(validate_file_path("README.md#top").is_err());
        assert!(validate_file_path("docs/%2e%2e/secret.md").is_err());
        assert!(validate_file_path("docs\\..\\x.md").is_err());
    }

    #[test]
    fn test_ref_validation() {
        assert!(validate_ref_input("").is_ok());
        assert!(validate_ref_input("main").is_ok());
        assert!(validate_ref_input("feature/toc-v2").is_ok());
        assert!(validate_ref_input("v1.2.3").is_ok());

        assert!(validate_ref_input("has space").is_err());
        assert!(validate_ref_input("a..b").is_err());
        assert!(validate_ref_input("head@{1}").is_err());
        assert!(validate_ref_input("what?").is_err());
        assert!(validate_ref_input("a//b").is_err());
        assert_eq!(
            validate_ref_input(".hidden").unwrap_err(),
            "Invalid branch/ref format"
        );
        assert!(validate_ref_input("main.lock").is_err());
    }
}
