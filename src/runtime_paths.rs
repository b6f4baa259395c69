use directories::ProjectDirs;

const APP_NAME: &str = "taskplanner";

/// `<platform data dir>/taskplanner/data/taskplanner.db`, or the temp dir when
/// the platform has no home directory.
pub fn default_db_path() -> String {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME))
        .join("data")
        .join(format!("{APP_NAME}.db"))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_db_path_names_the_planner_database() {
        let path = PathBuf::from(default_db_path());
        assert_eq!(path.file_name().unwrap(), "taskplanner.db");
        assert_eq!(path.parent().unwrap().file_name().unwrap(), "data");
    }
}
