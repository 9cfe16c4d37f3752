//! Module specifier resolution over virtual file names.
//!
//! File names use `/` separators. Project files carry absolute paths, dependency
//! files carry paths below `node_modules`; both resolve the same way.

/// Whether a specifier is relative to the importing file.
pub fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Directory part of a file name (`/a/b/c.ts` -> `/a/b`).
pub fn dirname(name: &str) -> &str {
    match name.rfind('/') {
        Some(0) => "/",
        Some(index) => &name[..index],
        None => "",
    }
}

/// Joins `specifier` onto `base_dir` and folds `.` and `..` segments.
pub fn join(base_dir: &str, specifier: &str) -> String {
    let absolute = if specifier.starts_with('/') {
        true
    } else {
        base_dir.starts_with('/')
    };
    let combined = if specifier.starts_with('/') {
        specifier.to_string()
    } else if base_dir.is_empty() {
        specifier.to_string()
    } else {
        format!("{}/{}", base_dir, specifier)
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in combined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// File names a module path may refer to, in lookup order.
pub fn candidates(path: &str) -> Vec<String> {
    if let Some(stem) = path.strip_suffix(".js") {
        return vec![
            format!("{stem}.ts"),
            format!("{stem}.tsx"),
            format!("{stem}.d.ts"),
            path.to_string(),
        ];
    }
    if let Some(stem) = path.strip_suffix(".mjs") {
        return vec![format!("{stem}.mts"), format!("{stem}.d.mts"), path.to_string()];
    }
    if [".ts", ".mts", ".tsx", ".cts"].iter().any(|ext| path.ends_with(ext)) {
        return vec![path.to_string()];
    }

    let mut found = Vec::new();
    for ext in [".ts", ".tsx", ".d.ts", ".mts", ".d.mts"] {
        found.push(format!("{path}{ext}"));
    }
    for index in ["index.ts", "index.tsx", "index.d.ts", "index.mts", "index.d.mts"] {
        found.push(format!("{path}/{index}"));
    }
    found
}

/// Resolves a relative or absolute specifier from `importer` to an existing file.
pub fn resolve_path(
    importer: &str,
    specifier: &str,
    exists: impl Fn(&str) -> bool,
) -> Option<String> {
    let target = join(dirname(importer), specifier);
    candidates(&target).into_iter().find(|candidate| exists(candidate))
}

/// Splits a bare specifier into package name and subpath
/// (`@scope/pkg/sub` -> `("@scope/pkg", Some("sub"))`).
pub fn split_package(specifier: &str) -> (&str, Option<&str>) {
    let mut boundary = specifier.match_indices('/');
    let split_at = if specifier.starts_with('@') {
        boundary.nth(1)
    } else {
        boundary.next()
    };
    match split_at {
        Some((index, _)) => (&specifier[..index], Some(&specifier[index + 1..])),
        None => (specifier, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_folds_segments() {
        assert_eq!(join("/project/src", "./models/user"), "/project/src/models/user");
        assert_eq!(join("/project/src", "../lib"), "/project/lib");
        assert_eq!(join("futen/dist", "./types.js"), "futen/dist/types.js");
        assert_eq!(join("/project", "/abs/file.ts"), "/abs/file.ts");
    }

    #[test]
    fn test_dirname() {
        assert_eq!(dirname("/project/src/a.ts"), "/project/src");
        assert_eq!(dirname("/a.ts"), "/");
        assert_eq!(dirname("a.ts"), "");
    }

    #[test]
    fn test_resolve_path_tries_typescript_extensions() {
        let files = [
            "/project/src/importer.ts",
            "/project/src/models/index.ts",
            "/project/lib.d.ts",
        ];
        let exists = |name: &str| files.contains(&name);

        assert_eq!(
            resolve_path("/project/src/a.ts", "./importer.js", exists).as_deref(),
            Some("/project/src/importer.ts")
        );
        assert_eq!(
            resolve_path("/project/src/a.ts", "./models", exists).as_deref(),
            Some("/project/src/models/index.ts")
        );
        assert_eq!(
            resolve_path("/project/src/a.ts", "../lib", exists).as_deref(),
            Some("/project/lib.d.ts")
        );
        assert_eq!(resolve_path("/project/src/a.ts", "./missing", exists), None);
    }

    #[test]
    fn test_split_package() {
        assert_eq!(split_package("futen"), ("futen", None));
        assert_eq!(split_package("futen/dist/index"), ("futen", Some("dist/index")));
        assert_eq!(split_package("@types/bun"), ("@types/bun", None));
        assert_eq!(split_package("@scope/pkg/sub"), ("@scope/pkg", Some("sub")));
    }

    #[test]
    fn test_is_relative() {
        assert!(is_relative("./a"));
        assert!(is_relative("../a"));
        assert!(!is_relative("futen"));
        assert!(!is_relative("/abs/a.ts"));
    }
}
