//! The dialog box.
//!
//! Messages are revealed character by character on a millisecond clock.
//! Escape sequences control the reveal: `$0` pauses for one second,
//! `$1`/`$2`/`$3` switch the speed, `$v` substitutes the variable registered
//! for the dialog, and a `110xxxxx` lead byte emits a two-byte UTF-8
//! sequence at once. A letter sound may play at most once per 100 ms.
//!
//! The box itself is engine state; drawing it and feeding it keys is done by
//! `systems::dialog`.

use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;

use crate::resources::dialogs::DialogStore;
use crate::resources::mapdata::DialogRecord;

/// Reveal delays in ms per character.
pub const SPEED_SLOW: u32 = 60;
pub const SPEED_MEDIUM: u32 = 45;
pub const SPEED_FAST: u32 = 30;

/// What the sword key does to the dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkipMode {
    #[default]
    None,
    /// Skip the current message.
    Current,
    /// Close the whole dialog.
    All,
}

impl SkipMode {
    pub fn parse(value: &str) -> Self {
        match value {
            "" | "none" => SkipMode::None,
            "current" => SkipMode::Current,
            "all" => SkipMode::All,
            other => panic!("unknown skip mode '{other}'"),
        }
    }
}

/// Visual style; the frameless style plays no letter sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogStyle {
    #[default]
    WithFrame,
    Frameless,
}

/// Result of feeding one tick or one key to the box.
#[derive(Debug, Clone, Copy, Default)]
pub struct DialogTick {
    pub play_letter_sound: bool,
    /// The current message just revealed its last character.
    pub message_finished: bool,
}

/// Raised when the whole dialog closed.
#[derive(Debug, Clone)]
pub struct DialogClosed {
    pub dialog_id: String,
    /// Answer of the last question, or -1 when none was asked.
    pub last_answer: i32,
}

/// The state of one running dialog.
#[derive(Debug, Clone)]
struct DialogRun {
    /// First message id; identifies the dialog to scripts and variables.
    first_id: String,
    current_id: String,
    record: DialogRecord,
    /// Remaining bytes of each line, consumed front to back.
    pending: [Vec<u8>; 3],
    /// Revealed text of each line.
    revealed: [String; 3],
    line: usize,
    delay: u32,
    next_char_date: u32,
    next_sound_date: u32,
    skip_mode: SkipMode,
    finished: bool,
    /// Cursor on the question answers, 0 or 1.
    answer: usize,
    last_answer: i32,
}

/// Dialog ids waiting to be started by the dialog system, in order.
#[derive(Resource, Debug, Clone, Default)]
pub struct PendingDialogs(pub Vec<String>);

/// A shop purchase waiting for its buy-question dialog to close: the shop
/// item entity and the dialog id that asked.
#[derive(Resource, Debug, Clone, Default)]
pub struct PendingShopPurchase(pub Option<(bevy_ecs::prelude::Entity, String)>);

/// The dialog box resource.
#[derive(Resource, Default)]
pub struct DialogBox {
    run: Option<DialogRun>,
    pub style: DialogStyle,
    /// `$v` substitutions, keyed by dialog id.
    variables: FxHashMap<String, String>,
}

impl DialogBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.run.is_some()
    }

    pub fn set_variable(&mut self, dialog_id: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(dialog_id.into(), value.into());
    }

    /// Id of the running dialog (its first message id).
    pub fn current_dialog_id(&self) -> Option<&str> {
        self.run.as_ref().map(|run| run.first_id.as_str())
    }

    /// Id of the current message of the running dialog.
    pub fn current_message_id(&self) -> Option<&str> {
        self.run.as_ref().map(|run| run.current_id.as_str())
    }

    pub fn is_question(&self) -> bool {
        self.run
            .as_ref()
            .is_some_and(|run| run.finished && run.record.question)
    }

    pub fn current_answer(&self) -> usize {
        self.run.as_ref().map_or(0, |run| run.answer)
    }

    pub fn icon(&self) -> i32 {
        self.run.as_ref().map_or(-1, |run| run.record.icon)
    }

    /// Revealed text of the three lines, for the renderer.
    pub fn lines(&self) -> [&str; 3] {
        match &self.run {
            Some(run) => [
                run.revealed[0].as_str(),
                run.revealed[1].as_str(),
                run.revealed[2].as_str(),
            ],
            None => ["", "", ""],
        }
    }

    pub fn is_message_finished(&self) -> bool {
        self.run.as_ref().is_some_and(|run| run.finished)
    }

    /// Open the box on the first message of `dialog_id`.
    pub fn start(&mut self, dialog_id: &str, store: &DialogStore, now: u32) {
        assert!(self.run.is_none(), "a dialog is already running");
        let record = store.get(dialog_id).clone();
        self.run = Some(Self::make_run(
            dialog_id.to_string(),
            dialog_id.to_string(),
            record,
            now,
            -1,
        ));
    }

    fn make_run(
        first_id: String,
        current_id: String,
        record: DialogRecord,
        now: u32,
        last_answer: i32,
    ) -> DialogRun {
        let pending = [
            record.line1.clone().into_bytes(),
            record.line2.clone().into_bytes(),
            record.line3.clone().into_bytes(),
        ];
        let skip_mode = SkipMode::parse(&record.skip);
        DialogRun {
            first_id,
            current_id,
            record,
            pending,
            revealed: Default::default(),
            line: 0,
            delay: SPEED_MEDIUM,
            next_char_date: now,
            next_sound_date: now,
            skip_mode,
            finished: false,
            answer: 0,
            last_answer,
        }
    }

    /// Advance the reveal up to `now`.
    pub fn update(&mut self, now: u32) -> DialogTick {
        let mut tick = DialogTick::default();
        let Some(run) = &mut self.run else {
            return tick;
        };
        if run.finished {
            return tick;
        }
        let mut revealed_any = false;
        while !run.finished && now >= run.next_char_date {
            Self::reveal_one(run, &self.variables, false);
            revealed_any = true;
            if run.finished {
                tick.message_finished = true;
            }
        }
        if revealed_any && self.style != DialogStyle::Frameless && now >= self.run.as_ref().unwrap().next_sound_date
        {
            tick.play_letter_sound = true;
            self.run.as_mut().unwrap().next_sound_date = now + 100;
        }
        tick
    }

    /// Reveal the remaining characters at once, without reveal delays. The
    /// sound budget still allows at most one letter sound.
    pub fn show_all_now(&mut self, now: u32) -> DialogTick {
        let mut tick = DialogTick::default();
        let Some(run) = &mut self.run else {
            return tick;
        };
        while !run.finished {
            Self::reveal_one(run, &self.variables, true);
        }
        tick.message_finished = true;
        if self.style != DialogStyle::Frameless && now >= run.next_sound_date {
            tick.play_letter_sound = true;
            run.next_sound_date = now + 100;
        }
        tick
    }

    /// Consume one unit of pending text: a character, an escape sequence or
    /// a whole `$v` substitution.
    fn reveal_one(run: &mut DialogRun, variables: &FxHashMap<String, String>, show_all: bool) {
        while run.line < 3 && run.pending[run.line].is_empty() {
            run.line += 1;
        }
        if run.line == 3 {
            run.finished = true;
            return;
        }
        let line = &mut run.pending[run.line];
        let byte = line.remove(0);
        match byte {
            b'$' => {
                let code = if line.is_empty() { b' ' } else { line.remove(0) };
                match code {
                    b'0' => {
                        if !show_all {
                            run.next_char_date += 1000;
                        }
                    }
                    b'1' => run.delay = SPEED_SLOW,
                    b'2' => run.delay = SPEED_MEDIUM,
                    b'3' => run.delay = SPEED_FAST,
                    b'v' => {
                        let value = variables.get(&run.first_id).unwrap_or_else(|| {
                            panic!("no variable set for dialog '{}'", run.first_id)
                        });
                        run.revealed[run.line].push_str(value);
                        run.next_char_date += run.delay;
                    }
                    other => panic!("unknown escape sequence '${}'", other as char),
                }
            }
            byte if byte & 0xE0 == 0xC0 => {
                // two-byte UTF-8 sequence: emit the continuation byte along
                let next = line.remove(0);
                let text = String::from_utf8(vec![byte, next]).expect("bad UTF-8 in dialog");
                run.revealed[run.line].push_str(&text);
                run.next_char_date += run.delay;
            }
            byte => {
                run.revealed[run.line].push(byte as char);
                run.next_char_date += run.delay;
            }
        }
        if run.pending.iter().all(|line| line.is_empty()) {
            run.finished = true;
        }
    }

    /// UP or DOWN while a question is shown.
    pub fn toggle_answer(&mut self) {
        if let Some(run) = &mut self.run {
            if run.finished && run.record.question {
                run.answer = 1 - run.answer;
            }
        }
    }

    /// The action key: reveal everything, or step to the next message.
    /// Returns the close notification when the dialog ends.
    pub fn key_action(
        &mut self,
        store: &DialogStore,
        now: u32,
    ) -> (DialogTick, Option<DialogClosed>) {
        let Some(run) = &mut self.run else {
            return (DialogTick::default(), None);
        };
        if !run.finished {
            let tick = self.show_all_now(now);
            return (tick, None);
        }
        let closed = self.advance(store, now);
        (DialogTick::default(), closed)
    }

    /// The sword key: apply the skip mode.
    pub fn key_sword(
        &mut self,
        store: &DialogStore,
        now: u32,
    ) -> (DialogTick, Option<DialogClosed>) {
        let Some(run) = &mut self.run else {
            return (DialogTick::default(), None);
        };
        match run.skip_mode {
            SkipMode::None => (DialogTick::default(), None),
            SkipMode::Current => {
                if !run.finished {
                    let tick = self.show_all_now(now);
                    (tick, None)
                } else {
                    let closed = self.advance(store, now);
                    (DialogTick::default(), closed)
                }
            }
            SkipMode::All => {
                let closed = self.close();
                (DialogTick::default(), Some(closed))
            }
        }
    }

    /// Step to the next message of the chain, closing when there is none.
    fn advance(&mut self, store: &DialogStore, now: u32) -> Option<DialogClosed> {
        let run = self.run.as_mut().expect("no dialog running");
        let last_answer = if run.record.question {
            assert!(run.answer <= 1, "dialog answer out of range: {}", run.answer);
            run.answer as i32
        } else {
            run.last_answer
        };
        let next_id = if run.record.question && run.answer == 1 && !run.record.next2.is_empty() {
            run.record.next2.clone()
        } else {
            run.record.next.clone()
        };
        if next_id.is_empty() {
            return Some(self.close_with_answer(last_answer));
        }
        let record = store.get(&next_id).clone();
        let first_id = run.first_id.clone();
        self.run = Some(Self::make_run(first_id, next_id, record, now, last_answer));
        None
    }

    /// Close immediately, keeping whatever answer was recorded.
    pub fn close(&mut self) -> DialogClosed {
        let last_answer = self.run.as_ref().map_or(-1, |run| run.last_answer);
        self.close_with_answer(last_answer)
    }

    fn close_with_answer(&mut self, last_answer: i32) -> DialogClosed {
        let run = self.run.take().expect("no dialog running");
        DialogClosed {
            dialog_id: run.first_id,
            last_answer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(records: &[(&str, DialogRecord)]) -> DialogStore {
        let mut store = DialogStore::new();
        for (id, record) in records {
            store.insert(*id, record.clone());
        }
        store
    }

    fn record(line1: &str) -> DialogRecord {
        DialogRecord {
            line1: line1.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn reveals_at_the_configured_speed() {
        let store = store_with(&[("hello", record("abc"))]);
        let mut dialog_box = DialogBox::new();
        dialog_box.start("hello", &store, 0);

        dialog_box.update(0);
        assert_eq!(dialog_box.lines()[0], "a");
        dialog_box.update(SPEED_MEDIUM * 2);
        assert_eq!(dialog_box.lines()[0], "abc");
        assert!(dialog_box.is_message_finished());
    }

    #[test]
    fn variable_substitution_counts_whole_value() {
        let store = store_with(&[("intro", record("Hello $v!"))]);
        let mut dialog_box = DialogBox::new();
        dialog_box.set_variable("intro", "world");
        dialog_box.start("intro", &store, 0);
        dialog_box.show_all_now(0);
        assert_eq!(dialog_box.lines()[0], "Hello world!");
    }

    #[test]
    #[should_panic(expected = "no variable set")]
    fn missing_variable_is_fatal() {
        let store = store_with(&[("intro", record("Hello $v!"))]);
        let mut dialog_box = DialogBox::new();
        dialog_box.start("intro", &store, 0);
        dialog_box.show_all_now(0);
    }

    #[test]
    fn speed_escapes_change_the_delay() {
        let store = store_with(&[("speedy", record("$3ab"))]);
        let mut dialog_box = DialogBox::new();
        dialog_box.start("speedy", &store, 0);
        // the escape costs no time; both chars reveal at the fast delay
        dialog_box.update(SPEED_FAST);
        assert_eq!(dialog_box.lines()[0], "ab");
    }

    #[test]
    fn pause_escape_holds_for_a_second() {
        let store = store_with(&[("pause", record("a$0b"))]);
        let mut dialog_box = DialogBox::new();
        dialog_box.start("pause", &store, 0);
        dialog_box.update(SPEED_MEDIUM);
        assert_eq!(dialog_box.lines()[0], "a");
        dialog_box.update(SPEED_MEDIUM + 999);
        assert_eq!(dialog_box.lines()[0], "a");
        dialog_box.update(SPEED_MEDIUM + 1000 + SPEED_MEDIUM);
        assert_eq!(dialog_box.lines()[0], "ab");
    }

    #[test]
    fn two_byte_utf8_is_emitted_atomically() {
        let store = store_with(&[("accent", record("café"))]);
        let mut dialog_box = DialogBox::new();
        dialog_box.start("accent", &store, 0);
        // é is a two-byte sequence but costs one reveal step
        dialog_box.update(SPEED_MEDIUM * 3);
        assert_eq!(dialog_box.lines()[0], "café");
        assert!(dialog_box.is_message_finished());
    }

    #[test]
    fn letter_sound_budget_is_100ms() {
        let store = store_with(&[("s", record("abcdefgh"))]);
        let mut dialog_box = DialogBox::new();
        dialog_box.start("s", &store, 0);
        let tick = dialog_box.update(0);
        assert!(tick.play_letter_sound);
        // 45 ms later a letter reveals but the budget is not yet refilled
        let tick = dialog_box.update(SPEED_MEDIUM);
        assert!(!tick.play_letter_sound);
        let tick = dialog_box.update(SPEED_MEDIUM * 3);
        assert!(tick.play_letter_sound);
    }

    #[test]
    fn question_routes_to_next2() {
        let mut question = record("Buy it?");
        question.question = true;
        question.next = "yes".to_string();
        question.next2 = "no".to_string();
        let store = store_with(&[
            ("ask", question),
            ("yes", record("Sold!")),
            ("no", record("Too bad.")),
        ]);

        let mut dialog_box = DialogBox::new();
        dialog_box.start("ask", &store, 0);
        dialog_box.show_all_now(0);
        dialog_box.toggle_answer();
        assert_eq!(dialog_box.current_answer(), 1);
        let (_, closed) = dialog_box.key_action(&store, 0);
        assert!(closed.is_none());
        assert_eq!(dialog_box.current_message_id(), Some("no"));

        dialog_box.show_all_now(0);
        let (_, closed) = dialog_box.key_action(&store, 0);
        let closed = closed.unwrap();
        assert_eq!(closed.dialog_id, "ask");
        assert_eq!(closed.last_answer, 1);
    }

    #[test]
    fn skip_all_closes_everything() {
        let mut first = record("one");
        first.next = "two".to_string();
        first.skip = "all".to_string();
        let store = store_with(&[("chain", first), ("two", record("two"))]);

        let mut dialog_box = DialogBox::new();
        dialog_box.start("chain", &store, 0);
        let (_, closed) = dialog_box.key_sword(&store, 0);
        let closed = closed.unwrap();
        assert_eq!(closed.dialog_id, "chain");
        assert_eq!(closed.last_answer, -1);
        assert!(!dialog_box.is_enabled());
    }

    #[test]
    fn close_notifies_with_issuer_id_and_minus_one() {
        let store = store_with(&[("intro", record("Hello"))]);
        let mut dialog_box = DialogBox::new();
        dialog_box.start("intro", &store, 0);
        dialog_box.show_all_now(0);
        let (_, closed) = dialog_box.key_action(&store, 0);
        let closed = closed.unwrap();
        assert_eq!(closed.dialog_id, "intro");
        assert_eq!(closed.last_answer, -1);
    }
}
