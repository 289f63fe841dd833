//! Scripts and actions executable inside a training pod.

/// Interpreter baked into the training image.
pub const PYTHON_INTERPRETER: &str = "python3.10";

/// Scripts shipped with the training image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodScript {
    Inference,
}

impl PodScript {
    /// Path of the script inside the training image.
    pub fn path(self) -> &'static str {
        match self {
            Self::Inference => "scripts/inference.py",
        }
    }
}

/// Actions understood by the inference script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceAction {
    Predict,
    Suggest,
    Calculate,
}

impl InferenceAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Predict => "predict",
            Self::Suggest => "suggest",
            Self::Calculate => "calculate",
        }
    }
}

/// Assemble the command vector for a pod exec.
///
/// Trailing arguments, if any, are joined with a comma into a single
/// token; an empty argument list appends nothing.
pub fn build_command(script: PodScript, action: InferenceAction, args: &[String]) -> Vec<String> {
    let mut command = vec![
        PYTHON_INTERPRETER.to_string(),
        script.path().to_string(),
        action.as_str().to_string(),
    ];
    if !args.is_empty() {
        command.push(args.join(","));
    }
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_without_args() {
        assert_eq!(
            build_command(PodScript::Inference, InferenceAction::Predict, &[]),
            vec!["python3.10", "scripts/inference.py", "predict"]
        );
    }

    #[test]
    fn trailing_args_join_with_comma() {
        let args = vec!["3".to_string(), "7".to_string(), "12".to_string()];
        assert_eq!(
            build_command(PodScript::Inference, InferenceAction::Suggest, &args),
            vec!["python3.10", "scripts/inference.py", "suggest", "3,7,12"]
        );
    }

    #[test]
    fn single_arg_has_no_separator() {
        let args = vec!["42".to_string()];
        assert_eq!(
            build_command(PodScript::Inference, InferenceAction::Calculate, &args),
            vec!["python3.10", "scripts/inference.py", "calculate", "42"]
        );
    }
}
