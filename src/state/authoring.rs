//! Conversational quiz authoring.
//!
//! [`AuthoringState::apply`] is a pure transition function: invalid input is reported
//! without touching the state, and input that does not belong to the current step is
//! ignored entirely.

use thiserror::Error;

use crate::state::quiz::{
    MAX_OPTION_CHARS, MAX_OPTIONS, MAX_QUESTION_CHARS, MAX_TITLE_CHARS, MIN_OPTIONS, Question,
    QuizDraft, UserId,
};

/// Where a user currently is in the authoring conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthoringStep {
    Idle,
    AwaitingTitle,
    AwaitingDescription,
    AwaitingQuestionText,
    /// Fewer than two options collected so far.
    AwaitingOption,
    /// At least two options collected; more may follow.
    AwaitingOptionOrDone,
    AwaitingCorrectOption,
    AwaitingMoreQuestionsOrFinish,
    /// The draft was handed to the store; only `Cancel` applies until the write settles.
    Saving,
    Saved,
}

/// One event of the authoring conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthoringInput {
    /// Start (or restart) composing a quiz.
    Begin,
    /// Free-form text message.
    Text(String),
    /// Leave the description empty.
    Skip,
    AddOption,
    DoneOptions,
    CorrectOption(usize),
    AnotherQuestion,
    Finish,
    Cancel,
}

/// Reason an input was rejected. The state is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("the title must not be empty")]
    EmptyTitle,
    #[error("the title must be at most {} characters", MAX_TITLE_CHARS)]
    TitleTooLong,
    #[error("the question must not be empty")]
    EmptyQuestion,
    #[error("the question must be at most {} characters", MAX_QUESTION_CHARS)]
    QuestionTooLong,
    #[error("an option must not be empty")]
    EmptyOption,
    #[error("an option must be at most {} characters", MAX_OPTION_CHARS)]
    OptionTooLong,
    #[error("a question can have at most {} options", MAX_OPTIONS)]
    TooManyOptions,
    #[error("option {index} does not exist (the question has {count} options)")]
    CorrectOptionOutOfRange { index: usize, count: usize },
    #[error("a quiz needs at least one question")]
    NoQuestions,
}

/// Errors raised by the authoring flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthoringError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationIssue),
}

/// What the conversation should ask for after a successful transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthoringPrompt {
    Title,
    Description,
    FirstQuestion,
    NextQuestion,
    /// Ask for the option with this 1-based number.
    Option { number: usize },
    /// Offer adding another option or moving on.
    OptionOrDone,
    /// Ask which of these options is correct.
    CorrectOption { options: Vec<String> },
    /// A question was completed; offer another one or finishing.
    QuestionAdded { question: Question },
}

/// Result of applying one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthoringOutcome {
    /// The input does not apply to the current step.
    Ignored,
    Advanced(AuthoringPrompt),
    /// The quiz is complete. The state waits in [`AuthoringStep::Saving`] until
    /// [`AuthoringState::commit_saved`] or [`AuthoringState::abort_save`].
    ReadyToSave(QuizDraft),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct QuestionInProgress {
    text: String,
    options: Vec<String>,
}

/// In-progress quiz of one author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthoringState {
    owner_id: UserId,
    step: AuthoringStep,
    title: String,
    description: String,
    questions: Vec<Question>,
    current: Option<QuestionInProgress>,
}

impl AuthoringState {
    pub fn new(owner_id: UserId) -> Self {
        Self {
            owner_id,
            step: AuthoringStep::Idle,
            title: String::new(),
            description: String::new(),
            questions: Vec::new(),
            current: None,
        }
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn step(&self) -> AuthoringStep {
        self.step
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Whether the conversation is between `Begin` and a successful save.
    pub fn is_active(&self) -> bool {
        !matches!(self.step, AuthoringStep::Idle | AuthoringStep::Saved)
    }

    /// Apply one input to the conversation.
    pub fn apply(&mut self, input: AuthoringInput) -> Result<AuthoringOutcome, AuthoringError> {
        use AuthoringInput as In;
        use AuthoringStep as Step;

        let outcome = match (self.step, input) {
            (Step::Saving, In::Cancel) => {
                *self = Self::new(self.owner_id);
                AuthoringOutcome::Cancelled
            }
            (Step::Saving, _) => AuthoringOutcome::Ignored,
            (_, In::Begin) => {
                *self = Self::new(self.owner_id);
                self.step = Step::AwaitingTitle;
                AuthoringOutcome::Advanced(AuthoringPrompt::Title)
            }
            (_, In::Cancel) if self.is_active() => {
                *self = Self::new(self.owner_id);
                AuthoringOutcome::Cancelled
            }
            (Step::AwaitingTitle, In::Text(text)) => {
                let title = text.trim();
                if title.is_empty() {
                    return Err(ValidationIssue::EmptyTitle.into());
                }
                if title.chars().count() > MAX_TITLE_CHARS {
                    return Err(ValidationIssue::TitleTooLong.into());
                }
                self.title = title.to_owned();
                self.step = Step::AwaitingDescription;
                AuthoringOutcome::Advanced(AuthoringPrompt::Description)
            }
            (Step::AwaitingDescription, input @ (In::Text(_) | In::Skip)) => {
                self.description = match input {
                    In::Text(text) => text.trim().to_owned(),
                    _ => String::new(),
                };
                self.questions.clear();
                self.step = Step::AwaitingQuestionText;
                AuthoringOutcome::Advanced(AuthoringPrompt::FirstQuestion)
            }
            (Step::AwaitingQuestionText, In::Text(text)) => {
                let text = text.trim();
                if text.is_empty() {
                    return Err(ValidationIssue::EmptyQuestion.into());
                }
                if text.chars().count() > MAX_QUESTION_CHARS {
                    return Err(ValidationIssue::QuestionTooLong.into());
                }
                self.current = Some(QuestionInProgress {
                    text: text.to_owned(),
                    options: Vec::new(),
                });
                self.step = Step::AwaitingOption;
                AuthoringOutcome::Advanced(AuthoringPrompt::Option { number: 1 })
            }
            (Step::AwaitingOption | Step::AwaitingOptionOrDone, In::Text(text)) => {
                self.push_option(&text)?
            }
            (Step::AwaitingOptionOrDone, In::AddOption) => {
                let count = self.current_options().len();
                if count >= MAX_OPTIONS {
                    return Err(ValidationIssue::TooManyOptions.into());
                }
                AuthoringOutcome::Advanced(AuthoringPrompt::Option { number: count + 1 })
            }
            (Step::AwaitingOptionOrDone, In::DoneOptions) => {
                self.step = Step::AwaitingCorrectOption;
                AuthoringOutcome::Advanced(AuthoringPrompt::CorrectOption {
                    options: self.current_options().to_vec(),
                })
            }
            (Step::AwaitingCorrectOption, In::CorrectOption(index)) => {
                let Some(current) = self.current.as_ref() else {
                    return Ok(AuthoringOutcome::Ignored);
                };
                let question = Question::new(current.text.clone(), current.options.clone(), index)
                    .ok_or(ValidationIssue::CorrectOptionOutOfRange {
                        index,
                        count: current.options.len(),
                    })?;
                self.questions.push(question.clone());
                self.current = None;
                self.step = Step::AwaitingMoreQuestionsOrFinish;
                AuthoringOutcome::Advanced(AuthoringPrompt::QuestionAdded { question })
            }
            (Step::AwaitingMoreQuestionsOrFinish, In::AnotherQuestion) => {
                self.step = Step::AwaitingQuestionText;
                AuthoringOutcome::Advanced(AuthoringPrompt::NextQuestion)
            }
            (Step::AwaitingMoreQuestionsOrFinish, In::Finish) => {
                if self.questions.is_empty() {
                    return Err(ValidationIssue::NoQuestions.into());
                }
                self.step = Step::Saving;
                AuthoringOutcome::ReadyToSave(QuizDraft {
                    owner_id: self.owner_id,
                    title: self.title.clone(),
                    description: self.description.clone(),
                    questions: self.questions.clone(),
                })
            }
            _ => AuthoringOutcome::Ignored,
        };

        Ok(outcome)
    }

    /// Mark the quiz as persisted. Only valid while [`AuthoringStep::Saving`].
    pub fn commit_saved(&mut self) -> bool {
        if self.step != AuthoringStep::Saving {
            return false;
        }
        self.step = AuthoringStep::Saved;
        true
    }

    /// The store refused the draft: reopen the conversation so finishing can be retried.
    pub fn abort_save(&mut self) -> bool {
        if self.step != AuthoringStep::Saving {
            return false;
        }
        self.step = AuthoringStep::AwaitingMoreQuestionsOrFinish;
        true
    }

    fn current_options(&self) -> &[String] {
        self.current
            .as_ref()
            .map(|current| current.options.as_slice())
            .unwrap_or_default()
    }

    fn push_option(&mut self, text: &str) -> Result<AuthoringOutcome, AuthoringError> {
        let option = text.trim();
        if option.is_empty() {
            return Err(ValidationIssue::EmptyOption.into());
        }
        if option.chars().count() > MAX_OPTION_CHARS {
            return Err(ValidationIssue::OptionTooLong.into());
        }
        let Some(current) = self.current.as_mut() else {
            return Ok(AuthoringOutcome::Ignored);
        };
        if current.options.len() >= MAX_OPTIONS {
            return Err(ValidationIssue::TooManyOptions.into());
        }

        current.options.push(option.to_owned());
        let count = current.options.len();
        if count < MIN_OPTIONS {
            self.step = AuthoringStep::AwaitingOption;
            Ok(AuthoringOutcome::Advanced(AuthoringPrompt::Option {
                number: count + 1,
            }))
        } else {
            self.step = AuthoringStep::AwaitingOptionOrDone;
            Ok(AuthoringOutcome::Advanced(AuthoringPrompt::OptionOrDone))
        }
    }
}
