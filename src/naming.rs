//! Default output file names.

const SOLUTION_MARKER: &str = "_soln";
const NOCODE_SUFFIX: &str = "_nocode";

/// Derive the assignment file name from a solution file name.
///
/// The extension is taken from the last path component only. Everything
/// before it, leading directories included, is the base: every `_soln` in
/// the base is removed, and a base without one gets `_nocode` appended
/// instead. The extension is kept exactly.
///
/// ```
/// use mlx_remove_code::derive_output_name;
///
/// assert_eq!(derive_output_name("lesson1_soln.mlx"), "lesson1.mlx");
/// assert_eq!(derive_output_name("lesson2.mlx"), "lesson2_nocode.mlx");
/// ```
pub fn derive_output_name(input: &str) -> String {
    let file_start = input.rfind(std::path::is_separator).map_or(0, |i| i + 1);
    let (stem, ext) = split_extension(&input[file_start..]);
    let base = &input[..file_start + stem.len()];

    let base = if base.contains(SOLUTION_MARKER) {
        base.replace(SOLUTION_MARKER, "")
    } else {
        format!("{base}{NOCODE_SUFFIX}")
    };

    format!("{base}{ext}")
}

/// Split a file name at its last dot. Leading dots belong to the stem, so
/// `.bashrc` has no extension.
fn split_extension(file: &str) -> (&str, &str) {
    match file.rfind('.') {
        Some(dot) if file[..dot].chars().any(|c| c != '.') => file.split_at(dot),
        _ => (file, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_solution_marker() {
        assert_eq!(derive_output_name("lesson1_soln.mlx"), "lesson1.mlx");
    }

    #[test]
    fn appends_nocode_without_marker() {
        assert_eq!(derive_output_name("lesson2.mlx"), "lesson2_nocode.mlx");
    }

    #[test]
    fn removes_every_occurrence() {
        assert_eq!(derive_output_name("a_soln_soln.mlx"), "a.mlx");
        assert_eq!(derive_output_name("hw_soln3_soln.mlx"), "hw3.mlx");
    }

    #[test]
    fn extension_is_preserved_exactly() {
        assert_eq!(derive_output_name("Lab_soln.MLX"), "Lab.MLX");
        assert_eq!(derive_output_name("notes.tar.gz"), "notes.tar_nocode.gz");
        assert_eq!(derive_output_name("README"), "README_nocode");
    }

    #[test]
    fn marker_in_extension_is_ignored() {
        assert_eq!(derive_output_name("lesson.x_soln"), "lesson_nocode.x_soln");
    }

    #[test]
    fn marker_in_directory_counts() {
        assert_eq!(derive_output_name("course_soln/week1.mlx"), "course/week1.mlx");
        assert_eq!(derive_output_name("course_soln/week1_soln.mlx"), "course/week1.mlx");
        assert_eq!(derive_output_name("course/week1_soln.mlx"), "course/week1.mlx");
    }

    #[test]
    fn dot_in_directory_is_not_an_extension() {
        assert_eq!(derive_output_name("course.v2/week1"), "course.v2/week1_nocode");
        assert_eq!(derive_output_name("course.v2/week1.mlx"), "course.v2/week1_nocode.mlx");
    }

    #[test]
    fn leading_dots_are_not_an_extension() {
        assert_eq!(split_extension(".mlx"), (".mlx", ""));
        assert_eq!(split_extension("..mlx"), ("..mlx", ""));
        assert_eq!(split_extension(".hidden.mlx"), (".hidden", ".mlx"));
        assert_eq!(derive_output_name(".mlx"), ".mlx_nocode");
    }
}
