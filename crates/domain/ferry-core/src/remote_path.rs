pub struct MirrorPath;

impl MirrorPath {
    /// Standardize directory separators to forward slashes.
    /// Remote paths always use `/` regardless of the local platform.
    pub fn normalize(path: &str) -> String {
        path.replace('\\', "/")
    }

    /// Split into non-empty segments, tolerating leading/trailing and
    /// duplicated separators.
    pub fn segments(path: &str) -> Vec<String> {
        Self::normalize(path)
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The remote root for a sync task: the destination folder with the
    /// local root's base name appended.
    pub fn destination_root(dest_folder: &str, local_root: &str) -> Option<String> {
        let mut segs = Self::segments(dest_folder);
        let base = Self::segments(local_root).pop()?;
        segs.push(base);
        Some(segs.join("/"))
    }

    /// Map a local file under `local_root` to its remote mirror path.
    ///
    /// The replacement is anchored at the position where `local_root`
    /// actually begins. A folder name that happens to repeat deeper in the
    /// tree must never be rewritten, so this compares path segments instead
    /// of substituting substrings.
    pub fn map(local_root: &str, remote_root: &str, local_file: &str) -> Option<String> {
        let root_segs = Self::segments(local_root);
        let file_segs = Self::segments(local_file);

        if file_segs.len() < root_segs.len() || file_segs[..root_segs.len()] != root_segs[..] {
            return None;
        }

        let mut out = Self::segments(remote_root);
        out.extend(file_segs[root_segs.len()..].iter().cloned());
        Some(out.join("/"))
    }
}
