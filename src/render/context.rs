//! 环境变量上下文过滤
//!
//! 只有名字匹配白名单中任一 glob 模式的环境变量才会暴露给模板。

use crate::Environment;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};

/// 把原始白名单值展开为扁平的模式列表
pub fn normalize_patterns<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    raw.iter()
        .flat_map(|entry| entry.as_ref().split(','))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// 编译模式集合；无法编译的模式会被跳过并记录警告
fn compile_patterns(patterns: &[String]) -> Option<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    let mut count = 0;

    for pattern in patterns {
        match GlobBuilder::new(pattern).case_insensitive(false).build() {
            Ok(glob) => {
                builder.add(glob);
                count += 1;
            }
            Err(e) => warn!(pattern = %pattern, error = %e, "Invalid environment name pattern"),
        }
    }

    if count == 0 {
        return None;
    }

    match builder.build() {
        Ok(set) => Some(set),
        Err(e) => {
            warn!(error = %e, "Failed to build environment pattern set");
            None
        }
    }
}

/// 按白名单过滤环境变量
///
/// 结果包含且只包含名字匹配至少一个模式的变量；没有模式时返回空上下文。
pub fn filter_environment<S: AsRef<str>>(
    pass_patterns: &[S],
    environment: &Environment,
) -> Environment {
    let patterns = normalize_patterns(pass_patterns);
    let Some(set) = compile_patterns(&patterns) else {
        debug!("No environment name patterns, template context is empty");
        return Environment::new();
    };

    let context: Environment = environment
        .iter()
        .filter(|(name, _)| set.is_match(name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    debug!(
        patterns = ?patterns,
        matched = context.len(),
        "Filtered environment for template context"
    );
    context
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Environment {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_normalize_patterns() {
        assert_eq!(
            normalize_patterns(&["CI_*, DRONE_*", " ", "HOME"]),
            vec!["CI_*", "DRONE_*", "HOME"]
        );
    }

    #[test]
    fn test_filter_by_prefix() {
        let environment = env(&[("CI_STATUS", "passed"), ("OTHER", "x")]);
        let context = filter_environment(&["CI_*"], &environment);

        assert_eq!(context.len(), 1);
        assert_eq!(context.get("CI_STATUS").map(String::as_str), Some("passed"));
    }

    #[test]
    fn test_filter_is_logical_or() {
        let environment = env(&[("A_1", "a"), ("B_1", "b"), ("C_1", "c")]);
        let context = filter_environment(&["A_*", "B_?"], &environment);

        assert!(context.contains_key("A_1"));
        assert!(context.contains_key("B_1"));
        assert!(!context.contains_key("C_1"));
    }

    #[test]
    fn test_filter_question_mark_and_class() {
        let environment = env(&[("X1", "1"), ("X12", "12"), ("Y1", "y")]);
        let context = filter_environment(&["[XZ]?"], &environment);

        assert_eq!(context.len(), 1);
        assert!(context.contains_key("X1"));
    }

    #[test]
    fn test_filter_is_case_sensitive() {
        let environment = env(&[("ci_status", "lower"), ("CI_STATUS", "upper")]);
        let context = filter_environment(&["CI_*"], &environment);

        assert_eq!(context.len(), 1);
        assert!(context.contains_key("CI_STATUS"));
    }

    #[test]
    fn test_no_patterns_yields_empty_context() {
        let environment = env(&[("CI_STATUS", "passed")]);
        let empty: [&str; 0] = [];

        assert!(filter_environment(&empty, &environment).is_empty());
        assert!(filter_environment(&[" , "], &environment).is_empty());
    }

    #[test]
    fn test_soundness_and_completeness() {
        let environment = env(&[
            ("CI_A", "1"),
            ("CI_B", "2"),
            ("DRONE_X", "3"),
            ("PATH", "/bin"),
            ("HOME", "/root"),
        ]);
        let patterns = ["CI_*", "HOM?"];
        let context = filter_environment(&patterns, &environment);

        let set = compile_patterns(&normalize_patterns(&patterns)).unwrap();
        for name in environment.keys() {
            assert_eq!(set.is_match(name), context.contains_key(name), "{name}");
        }
    }
}
