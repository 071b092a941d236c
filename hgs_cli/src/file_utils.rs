use std::path::{Path, PathBuf};

/// Every `.vrp` file below `folder_path`, sorted.
pub fn read_folder(folder_path: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder_path)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() {
            if path.extension().is_some_and(|extension| extension == "vrp") {
                files.push(path);
            }
        } else if path.is_dir() {
            files.extend(read_folder(&path)?);
        }
    }

    files.sort();

    Ok(files)
}

/// `X-n101-k25.vrp` -> `X-n101-k25.sol`, next to the instance.
pub fn solution_path(instance_path: &Path) -> PathBuf {
    instance_path.with_extension("sol")
}

pub fn instance_name(instance_path: &Path) -> String {
    instance_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
