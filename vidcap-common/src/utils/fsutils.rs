use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Collects all files that are immediate children of the given directory, does not walk
/// it recursively.
pub fn files_in_dir(dir: impl AsRef<Path>) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    Ok(files)
}

/// Try to read the file, return None if it doesn't exist
pub fn read_optional_file(path: impl AsRef<Path>) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
        Ok(s) => Ok(Some(s)),
    }
}

/// The last component of the path as a lossy string, or the whole path if it doesn't
/// have one.
pub fn basename(path: &Path) -> String {
    match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => path.to_string_lossy().into_owned(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn files_in_dir_skips_subdirs() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("a"), "")?;
        fs::write(dir.path().join("b"), "")?;
        fs::create_dir(dir.path().join("sub"))?;
        fs::write(dir.path().join("sub").join("c"), "")?;

        let mut files = files_in_dir(dir.path())?;
        files.sort();
        let names: Vec<_> = files.iter().map(|p| basename(p)).collect();
        assert_eq!(vec!["a", "b"], names);
        Ok(())
    }

    #[test]
    fn optional_file() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("exists");
        fs::write(&path, "hello")?;

        assert_eq!(Some("hello".to_string()), read_optional_file(&path)?);
        assert_eq!(None, read_optional_file(dir.path().join("missing"))?);
        Ok(())
    }

    #[test]
    fn basename_of() {
        assert_eq!("b.mp4", basename(Path::new("/a/b.mp4")));
        assert_eq!("b.mp4", basename(Path::new("b.mp4")));
    }
}
