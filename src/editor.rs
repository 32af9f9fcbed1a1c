//! Query editor state: tabs and their text buffers.
//!
//! [`ActiveQueryEditor`] owns every tab's query text. The rest of the panel
//! reads the active query through [`ActiveQueryEditor::current_query`] and
//! changes it only through the holder.

/// Identifier of an editor tab, unique within one [`ActiveQueryEditor`].
pub type TabId = u64;

/// Multi-line text buffer with a cursor.
///
/// The cursor is a char index, so multi-byte input never splits a code point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryBuffer {
    text: String,
    cursor: usize,
}

impl QueryBuffer {
    /// Creates a buffer holding `text` with the cursor at the end.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Replaces the whole text and moves the cursor to the end.
    pub fn set_text(&mut self, text: impl Into<String>) {
        *self = Self::new(text);
    }

    fn len_chars(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(b, _)| b)
            .unwrap_or(self.text.len())
    }

    /// Char offsets at which each line starts. Always has at least one entry.
    fn line_starts(&self) -> Vec<usize> {
        let mut starts = vec![0];
        for (i, c) in self.text.chars().enumerate() {
            if c == '\n' {
                starts.push(i + 1);
            }
        }
        starts
    }

    fn line_len(starts: &[usize], row: usize, total: usize) -> usize {
        let end = starts.get(row + 1).map(|s| s - 1).unwrap_or(total);
        end - starts[row]
    }

    /// Returns the cursor as (row, column), both zero-based.
    pub fn cursor_position(&self) -> (usize, usize) {
        let starts = self.line_starts();
        let row = starts
            .iter()
            .rposition(|&s| s <= self.cursor)
            .unwrap_or(0);
        (row, self.cursor - starts[row])
    }

    fn move_to(&mut self, row: usize, col: usize) {
        let starts = self.line_starts();
        let row = row.min(starts.len() - 1);
        let len = Self::line_len(&starts, row, self.len_chars());
        self.cursor = starts[row] + col.min(len);
    }

    /// Inserts a character at the cursor position.
    pub fn insert(&mut self, c: char) {
        let idx = self.byte_index(self.cursor);
        self.text.insert(idx, c);
        self.cursor += 1;
    }

    pub fn newline(&mut self) {
        self.insert('\n');
    }

    /// Deletes the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let idx = self.byte_index(self.cursor);
            self.text.remove(idx);
        }
    }

    /// Deletes the character at the cursor.
    pub fn delete(&mut self) {
        if self.cursor < self.len_chars() {
            let idx = self.byte_index(self.cursor);
            self.text.remove(idx);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.len_chars() {
            self.cursor += 1;
        }
    }

    pub fn move_up(&mut self) {
        let (row, col) = self.cursor_position();
        if row > 0 {
            self.move_to(row - 1, col);
        }
    }

    pub fn move_down(&mut self) {
        let (row, col) = self.cursor_position();
        if row + 1 < self.line_starts().len() {
            self.move_to(row + 1, col);
        }
    }

    /// Moves the cursor to the start of the current line.
    pub fn move_home(&mut self) {
        let (row, _) = self.cursor_position();
        self.move_to(row, 0);
    }

    /// Moves the cursor to the end of the current line.
    pub fn move_end(&mut self) {
        let (row, _) = self.cursor_position();
        self.move_to(row, usize::MAX);
    }
}

/// One editor tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorTab {
    pub id: TabId,
    pub title: String,
    pub buffer: QueryBuffer,
}

impl EditorTab {
    pub fn new(id: TabId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            buffer: QueryBuffer::default(),
        }
    }

    /// Returns the tab's query text.
    pub fn query(&self) -> &str {
        self.buffer.text()
    }
}

/// Owns the editor tabs and tracks which one is active.
#[derive(Debug, Clone)]
pub struct ActiveQueryEditor {
    tabs: Vec<EditorTab>,
    active: usize,
    next_id: TabId,
}

impl Default for ActiveQueryEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl ActiveQueryEditor {
    /// Creates an editor with a single empty tab.
    pub fn new() -> Self {
        let mut editor = Self {
            tabs: Vec::new(),
            active: 0,
            next_id: 1,
        };
        editor.new_tab();
        editor
    }

    fn fresh_tab(&mut self) -> EditorTab {
        let id = self.next_id;
        self.next_id += 1;
        EditorTab::new(id, format!("Query {id}"))
    }

    /// Returns the active tab's query text.
    pub fn current_query(&self) -> &str {
        self.active_tab().query()
    }

    /// Replaces the active tab's query text.
    pub fn handle_query_change(&mut self, text: impl Into<String>) {
        self.buffer_mut().set_text(text);
    }

    pub fn editor_tabs(&self) -> &[EditorTab] {
        &self.tabs
    }

    /// Replaces the tab list.
    ///
    /// An empty list is replaced by a single fresh tab, and the active index
    /// is clamped to the new length.
    pub fn update_editor_tabs(&mut self, tabs: Vec<EditorTab>) {
        let max_id = tabs.iter().map(|t| t.id).max().unwrap_or(0);
        self.next_id = self.next_id.max(max_id + 1);
        self.tabs = tabs;
        if self.tabs.is_empty() {
            let tab = self.fresh_tab();
            self.tabs.push(tab);
        }
        self.active = self.active.min(self.tabs.len() - 1);
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_tab(&self) -> &EditorTab {
        &self.tabs[self.active]
    }

    pub fn buffer(&self) -> &QueryBuffer {
        &self.tabs[self.active].buffer
    }

    pub fn buffer_mut(&mut self) -> &mut QueryBuffer {
        &mut self.tabs[self.active].buffer
    }

    /// Opens a new empty tab after the existing ones and activates it.
    pub fn new_tab(&mut self) -> TabId {
        let tab = self.fresh_tab();
        let id = tab.id;
        self.tabs.push(tab);
        self.active = self.tabs.len() - 1;
        id
    }

    /// Closes the active tab. The last remaining tab is never closed.
    pub fn close_active_tab(&mut self) -> bool {
        if self.tabs.len() <= 1 {
            return false;
        }
        self.tabs.remove(self.active);
        self.active = self.active.min(self.tabs.len() - 1);
        true
    }

    /// Renames the tab with the given id. Returns false if no such tab exists.
    pub fn rename_tab(&mut self, id: TabId, title: impl Into<String>) -> bool {
        match self.tabs.iter_mut().find(|t| t.id == id) {
            Some(tab) => {
                tab.title = title.into();
                true
            }
            None => false,
        }
    }

    pub fn select_next(&mut self) {
        self.active = (self.active + 1) % self.tabs.len();
    }

    pub fn select_previous(&mut self) {
        self.active = (self.active + self.tabs.len() - 1) % self.tabs.len();
    }
}
