use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Write an executable `/bin/sh` script.
pub(crate) fn write_script(path: &Path, body: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, format!("#!/bin/sh\nset -e\n{body}")).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Write `contents` to `root/<major>/<variant>/Dockerfile`.
pub(crate) fn write_dockerfile(root: &Path, major: &str, variant: &str, contents: &str) {
    let dir = root.join(major).join(variant);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("Dockerfile"), contents).unwrap();
}
