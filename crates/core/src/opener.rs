use crate::error::Result;
use crate::model::NamespaceHit;
use std::path::{Path, PathBuf};

/// Hands a resolved solution to whatever hosts the editor.
pub trait SolutionOpener: Send + Sync {
    fn open(&self, solution_path: &Path, new_window: bool) -> Result<()>;
}

/// Distinct solutions across `hits`, in the order a chooser should list them.
pub fn candidate_solutions(hits: &[NamespaceHit]) -> Vec<PathBuf> {
    let mut seen = std::collections::HashSet::new();
    hits.iter()
        .flat_map(|hit| hit.solution_paths.iter())
        .filter(|path| seen.insert(crate::model::path_key(path)))
        .cloned()
        .collect()
}

/// Open the only candidate, or the one at `pick` when there are several.
///
/// Returns the opened path, or `None` when there is nothing unambiguous to open.
pub fn open_candidate(
    opener: &dyn SolutionOpener,
    candidates: &[PathBuf],
    pick: Option<usize>,
    new_window: bool,
) -> Result<Option<PathBuf>> {
    let chosen = match (candidates, pick) {
        ([], _) => None,
        ([only], None) => Some(only),
        (_, Some(index)) => candidates.get(index),
        (_, None) => None,
    };

    let Some(path) = chosen else {
        return Ok(None);
    };
    opener.open(path, new_window)?;
    Ok(Some(path.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(PathBuf, bool)>>);

    impl SolutionOpener for Recorder {
        fn open(&self, solution_path: &Path, new_window: bool) -> Result<()> {
            self.0
                .lock()
                .unwrap()
                .push((solution_path.to_path_buf(), new_window));
            Ok(())
        }
    }

    fn hit(slns: &[&str]) -> NamespaceHit {
        NamespaceHit {
            namespace: "Acme".into(),
            project_path: PathBuf::from("/r/A/A.csproj"),
            solution_paths: slns.iter().map(PathBuf::from).collect(),
        }
    }

    #[test]
    fn candidates_are_distinct_ignoring_case() {
        let hits = vec![hit(&["/r/All.sln", "/r/A.sln"]), hit(&["/r/ALL.sln"])];
        assert_eq!(
            candidate_solutions(&hits),
            vec![PathBuf::from("/r/All.sln"), PathBuf::from("/r/A.sln")]
        );
    }

    #[test]
    fn single_candidate_opens_without_pick() {
        let recorder = Recorder::default();
        let opened = open_candidate(&recorder, &[PathBuf::from("/r/All.sln")], None, true).unwrap();
        assert_eq!(opened, Some(PathBuf::from("/r/All.sln")));
        assert_eq!(
            recorder.0.lock().unwrap().as_slice(),
            &[(PathBuf::from("/r/All.sln"), true)]
        );
    }

    #[test]
    fn ambiguous_candidates_need_a_pick() {
        let recorder = Recorder::default();
        let candidates = vec![PathBuf::from("/r/A.sln"), PathBuf::from("/r/B.sln")];

        assert_eq!(open_candidate(&recorder, &candidates, None, false).unwrap(), None);
        assert_eq!(open_candidate(&recorder, &candidates, Some(5), false).unwrap(), None);
        assert_eq!(
            open_candidate(&recorder, &candidates, Some(1), false).unwrap(),
            Some(PathBuf::from("/r/B.sln"))
        );
        assert_eq!(recorder.0.lock().unwrap().len(), 1);
    }
}
