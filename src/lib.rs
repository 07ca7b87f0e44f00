// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Build tasks for translating Markdown documents with Gettext.
//!
//! Given a list of source files and a list of locales, this crate
//! defines a graph of file tasks which keep a set of PO files up to
//! date and produce a translated copy of every source file:
//!
//! - `<po-dir>/<locale>/<file>.pot` is extracted from the source file,
//! - `<po-dir>/<locale>/<file>.edit.po` is the draft edited by
//!   translators,
//! - `<po-dir>/<locale>/<file>.po` is the compacted form of the draft,
//! - `<po-dir>/<locale>.po` is the catalog of the whole locale,
//! - `<locale>/<file>` is the translated file.
//!
//! Tasks only run when their output is older than their inputs. See
//! [`tasks::I18nTasks`] for the entry point.

use pulldown_cmark::{Event, LinkType, Tag};
use pulldown_cmark_to_cmark::{cmark_resume_with_options, Options, State};

pub mod catalog;
pub mod clock;
pub mod config;
pub mod edit_po;
pub mod error;
pub mod gettext;
pub mod graph;
pub mod paths;
pub mod po;
pub mod staleness;
pub mod tasks;
pub mod tools;
pub mod translate;
pub mod xgettext;

pub use config::Config;
pub use error::{Error, Result};
pub use paths::{ArtifactPaths, Layout};
pub use tasks::{I18nTasks, Target};
pub use tools::Toolbox;

/// Create a Markdown parser with the extensions we support.
///
/// This enables tables, footnotes, strikethrough, task lists and
/// heading attributes, but not smart punctuation: we want to get the
/// source text back when rendering the events.
pub fn new_cmark_parser(text: &str) -> pulldown_cmark::Parser<'_, '_> {
    let mut options = pulldown_cmark::Options::empty();
    options.insert(pulldown_cmark::Options::ENABLE_TABLES);
    options.insert(pulldown_cmark::Options::ENABLE_FOOTNOTES);
    options.insert(pulldown_cmark::Options::ENABLE_STRIKETHROUGH);
    options.insert(pulldown_cmark::Options::ENABLE_TASKLISTS);
    options.insert(pulldown_cmark::Options::ENABLE_HEADING_ATTRIBUTES);
    pulldown_cmark::Parser::new_ext(text, options)
}

/// Extract Markdown events from `text`.
///
/// The `state` can be used to give the parsing context. In
/// particular, if a code block has started, the text should be parsed
/// without interpreting special Markdown characters.
///
/// The events are labeled with the line number where they start in
/// the document.
///
/// # Examples
///
/// ```
/// use i18n_po_tasks::extract_events;
/// use pulldown_cmark::{Event, Tag};
///
/// assert_eq!(
///     extract_events("Hello,\nworld!", None),
///     vec![
///         (1, Event::Start(Tag::Paragraph)),
///         (1, Event::Text("Hello,".into())),
///         (1, Event::Text(" ".into())),
///         (2, Event::Text("world!".into())),
///         (1, Event::End(Tag::Paragraph)),
///     ]
/// );
/// ```
pub fn extract_events<'a>(text: &'a str, state: Option<State<'static>>) -> Vec<(usize, Event<'a>)> {
    // Offsets of each newline in the input, used to calculate line
    // numbers from byte offsets.
    let offsets = text
        .match_indices('\n')
        .map(|(offset, _)| offset)
        .collect::<Vec<_>>();

    fn expand_shortcut_link(tag: Tag) -> Tag {
        match tag {
            Tag::Link(LinkType::Shortcut, reference, title) => {
                Tag::Link(LinkType::Reference, reference, title)
            }
            Tag::Image(LinkType::Shortcut, reference, title) => {
                Tag::Image(LinkType::Reference, reference, title)
            }
            _ => tag,
        }
    }

    match state {
        // Inside a code block the text is returned line by line,
        // matching what the parser would do.
        Some(state) if state.is_in_code_block => text
            .split_inclusive('\n')
            .enumerate()
            .map(|(idx, line)| (idx + 1, Event::Text(line.into())))
            .collect(),
        _ => new_cmark_parser(text)
            .into_offset_iter()
            .map(|(event, range)| {
                let lineno = offsets.partition_point(|&o| o < range.start) + 1;
                let event = match event {
                    Event::SoftBreak => Event::Text(" ".into()),
                    // A shortcut link like "[foo]" is turned into a
                    // reference link so the output is self-contained.
                    Event::Start(tag @ Tag::Link(..) | tag @ Tag::Image(..)) => {
                        Event::Start(expand_shortcut_link(tag))
                    }
                    Event::End(tag @ Tag::Link(..) | tag @ Tag::Image(..)) => {
                        Event::End(expand_shortcut_link(tag))
                    }
                    _ => event,
                };
                (lineno, event)
            })
            .collect(),
    }
}

/// Markdown events grouped by type.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Group<'a> {
    /// Events which make up one translatable message, such as
    /// `[Text("foo ")), Start(Emphasis), Text("bar"), End(Emphasis)]`.
    Translate(&'a [(usize, Event<'a>)]),

    /// Structural events which are copied unchanged, such as
    /// `Start(Heading(H1, None, vec![]))`.
    Skip(&'a [(usize, Event<'a>)]),
}

/// Group Markdown events into translatable and skipped events.
///
/// Concatenating the events in each group gives back the original
/// events.
pub fn group_events<'a>(events: &'a [(usize, Event<'a>)]) -> Vec<Group<'a>> {
    let mut groups = Vec::new();

    enum State {
        Translate(usize),
        Skip(usize),
    }
    let mut state = State::Skip(0);

    for (idx, (_, event)) in events.iter().enumerate() {
        match event {
            Event::Start(
                Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link(..) | Tag::Image(..),
            )
            | Event::End(
                Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link(..) | Tag::Image(..),
            )
            | Event::Text(_)
            | Event::Code(_)
            | Event::FootnoteReference(_)
            | Event::SoftBreak
            | Event::HardBreak => {
                if let State::Skip(start) = state {
                    groups.push(Group::Skip(&events[start..idx]));
                    state = State::Translate(idx);
                }
            }
            _ => {
                if let State::Translate(start) = state {
                    groups.push(Group::Translate(&events[start..idx]));
                    state = State::Skip(idx);
                }
            }
        }
    }

    match state {
        State::Translate(start) => groups.push(Group::Translate(&events[start..])),
        State::Skip(start) => groups.push(Group::Skip(&events[start..])),
    }

    groups
}

/// Render a slice of Markdown events back to Markdown.
///
/// The Markdown is normalized: `_` is used for emphasis and `**` for
/// strong emphasis.
///
/// # Examples
///
/// ```
/// use i18n_po_tasks::{extract_events, reconstruct_markdown};
///
/// let group = extract_events("Hello *world!*", None);
/// let (reconstructed, _) = reconstruct_markdown(&group, None);
/// assert_eq!(reconstructed, "Hello _world!_");
/// ```
pub fn reconstruct_markdown(
    group: &[(usize, Event)],
    state: Option<State<'static>>,
) -> (String, State<'static>) {
    let events = group.iter().map(|(_, event)| event);
    let mut markdown = String::new();
    let options = Options {
        code_block_token_count: 3,
        list_token: '-',
        emphasis_token: '_',
        strong_token: "**",
        ..Options::default()
    };
    // Advance the true state, but throw away the rendered Markdown
    // since it can contain unwanted padding.
    let new_state = cmark_resume_with_options(
        events.clone(),
        String::new(),
        state.clone(),
        options.clone(),
    )
    .unwrap();

    // Block quotes and lists add padding to the state. We render the
    // group without it so the messages do not depend on the nesting.
    let state_without_padding = state.map(|state| State {
        padding: Vec::new(),
        ..state
    });
    cmark_resume_with_options(events, &mut markdown, state_without_padding, options).unwrap();
    (markdown, new_state)
}

/// Extract translatable strings from `document`.
///
/// Every message is returned with the line number where it starts.
///
/// # Examples
///
/// ```
/// use i18n_po_tasks::extract_messages;
///
/// assert_eq!(
///     extract_messages("# A heading\n\n- First item\n- Second item\n"),
///     vec![
///         (1, "A heading".into()),
///         (3, "First item".into()),
///         (4, "Second item".into()),
///     ],
/// );
/// ```
pub fn extract_messages(document: &str) -> Vec<(usize, String)> {
    let events = extract_events(document, None);
    let mut messages = Vec::new();
    let mut state = None;
    for group in group_events(&events) {
        match group {
            Group::Translate(events) => {
                if let Some((lineno, _)) = events.first() {
                    let (text, new_state) = reconstruct_markdown(events, state);
                    messages.push((*lineno, text));
                    state = Some(new_state);
                }
            }
            Group::Skip(events) => {
                let (_, new_state) = reconstruct_markdown(events, state);
                state = Some(new_state);
            }
        }
    }

    messages
}
