//! Minimal ASCII DXF support.
//!
//! A drawing is kept as the flat list of group code / value pairs it was read
//! from, so writing it back preserves everything this module does not
//! understand. Only the pieces the grid workflow needs are interpreted:
//! header variables, `LAYER`/`STYLE` table entries, and model space
//! `POINT`, `CIRCLE` and `TEXT` entities.

use std::path::Path;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

use crate::error::{Error, Result};
use crate::geometry::{Point, Point3};
use crate::settings::EntityKind;

use super::{read_bytes, write_bytes};

/// One group code and its value line.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPair {
    pub code: i32,
    pub value: String,
}

impl GroupPair {
    pub fn new(code: i32, value: impl Into<String>) -> Self {
        Self {
            code,
            value: value.into(),
        }
    }

    fn is(&self, code: i32, value: &str) -> bool {
        self.code == code && self.value.eq_ignore_ascii_case(value)
    }
}

fn pair(code: i32, value: impl ToString) -> GroupPair {
    GroupPair::new(code, value.to_string())
}

/// Entity view into a document: the `0` pair naming the entity followed by
/// its attributes.
#[derive(Debug, Clone, Copy)]
pub struct Entity<'a> {
    start: usize,
    pairs: &'a [GroupPair],
}

impl<'a> Entity<'a> {
    /// Entity type name, e.g. `POINT`.
    pub fn kind(&self) -> &'a str {
        &self.pairs[0].value
    }

    /// First value carrying `code`.
    pub fn get(&self, code: i32) -> Option<&'a str> {
        self.find(code).map(|(_, v)| v)
    }

    pub fn layer(&self) -> &'a str {
        self.get(8).unwrap_or("0")
    }

    /// Entities flagged `67 = 1` live in paper space.
    pub fn in_model_space(&self) -> bool {
        self.get(67).map_or(true, |v| v.trim() != "1")
    }

    fn find(&self, code: i32) -> Option<(usize, &'a str)> {
        self.pairs
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, p)| p.code == code)
            .map(|(k, p)| (k, p.value.as_str()))
    }

    /// Line number of the value belonging to pair `k` of this entity.
    fn value_line(&self, k: usize) -> usize {
        2 * (self.start + k) + 2
    }

    fn coordinate(&self, code: i32) -> Result<Option<f64>> {
        match self.find(code) {
            None => Ok(None),
            Some((k, v)) => v.trim().parse().map(Some).map_err(|e| {
                Error::format(self.value_line(k), format!("group {code} value {v:?}: {e}"))
            }),
        }
    }

    /// Primary location (codes 10/20/30): the location of a `POINT`, the
    /// center of a `CIRCLE`, the insertion point of a `TEXT`.
    ///
    /// A missing X or Y is a [`Error::Dimension`]; a missing Z defaults to 0.
    pub fn location(&self) -> Result<Point3> {
        let x = self.coordinate(10)?;
        let y = self.coordinate(20)?;
        let z = self.coordinate(30)?.unwrap_or(0.0);
        match (x, y) {
            (Some(x), Some(y)) => Ok(Point3::new(x, y, z)),
            _ => Err(Error::Dimension(format!(
                "{} entity at line {} lacks an X or Y coordinate",
                self.kind(),
                self.value_line(0)
            ))),
        }
    }
}

/// ASCII DXF drawing held as group code pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct DxfDocument {
    pairs: Vec<GroupPair>,
    next_handle: Option<u64>,
    encoding: &'static Encoding,
}

/// Encoding named by a `$DWGCODEPAGE` value such as `ANSI_1250`. Unknown
/// code pages fall back to `ANSI_1252`, the DXF default.
fn code_page_encoding(code_page: &str) -> &'static Encoding {
    let name = code_page.trim().to_ascii_uppercase();
    let label = match name.as_str() {
        "ANSI_932" | "DOS932" => "shift_jis".to_string(),
        "ANSI_936" => "gbk".to_string(),
        "ANSI_949" => "euc-kr".to_string(),
        "ANSI_950" => "big5".to_string(),
        other => match other.strip_prefix("ANSI_") {
            Some(number) => format!("windows-{number}"),
            None => return WINDOWS_1252,
        },
    };
    Encoding::for_label(label.as_bytes()).unwrap_or(WINDOWS_1252)
}

/// `$DWGCODEPAGE` value found by scanning raw file bytes. The header is
/// ASCII, so a lossy view is enough to locate it.
fn declared_code_page(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let mut lines = text.lines().map(str::trim);
    lines.position(|l| l == "$DWGCODEPAGE")?;
    // skip the group code of the value
    lines.nth(1).map(str::to_string)
}

impl Default for DxfDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl DxfDocument {
    /// Creates an empty R12 drawing with a header and an entities section.
    pub fn new() -> Self {
        let pairs = vec![
            pair(0, "SECTION"),
            pair(2, "HEADER"),
            pair(9, "$ACADVER"),
            pair(1, "AC1009"),
            pair(0, "ENDSEC"),
            pair(0, "SECTION"),
            pair(2, "ENTITIES"),
            pair(0, "ENDSEC"),
            pair(0, "EOF"),
        ];
        Self {
            pairs,
            next_handle: None,
            encoding: UTF_8,
        }
    }

    /// Parses DXF text. Parsing stops at the `EOF` marker.
    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text.lines().collect();
        let mut pairs = Vec::with_capacity(lines.len() / 2);
        let mut idx = 0;
        while idx < lines.len() {
            let code_line = lines[idx].trim();
            if code_line.is_empty() && idx + 1 >= lines.len() {
                break;
            }
            let code: i32 = code_line
                .parse()
                .map_err(|_| Error::format(idx + 1, format!("invalid group code {code_line:?}")))?;
            let value = lines
                .get(idx + 1)
                .ok_or_else(|| Error::format(idx + 2, format!("group {code} has no value")))?
                .trim();
            pairs.push(GroupPair::new(code, value));
            idx += 2;
            if code == 0 && value == "EOF" {
                break;
            }
        }
        let mut doc = Self {
            pairs,
            next_handle: None,
            encoding: UTF_8,
        };
        doc.next_handle = doc
            .header_var("$HANDSEED")
            .and_then(|v| v.first().and_then(|p| u64::from_str_radix(p.value.trim(), 16).ok()));
        Ok(doc)
    }

    /// Decodes raw file contents. Text that is not valid UTF-8 is decoded
    /// with the code page named by `$DWGCODEPAGE`, which is also used when
    /// the drawing is written back.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if let Ok(text) = std::str::from_utf8(bytes) {
            return Self::parse(text);
        }
        let encoding = declared_code_page(bytes)
            .map_or(WINDOWS_1252, |cp| code_page_encoding(&cp));
        let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
        if had_errors {
            log::warn!("DXF text has bytes outside {}", encoding.name());
        }
        log::debug!("decoding DXF as {}", encoding.name());
        let mut doc = Self::parse(&text)?;
        doc.encoding = encoding;
        Ok(doc)
    }

    pub fn read(path: &Path) -> Result<Self> {
        Self::from_bytes(&read_bytes(path)?)
    }

    /// Character encoding used when the drawing is written.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Serialized drawing in the document's encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        let text = self.to_dxf_string();
        let (bytes, _, unmappable) = self.encoding.encode(&text);
        if unmappable {
            log::warn!(
                "some characters cannot be written as {}; they are stored as character references",
                self.encoding.name()
            );
        }
        bytes.into_owned()
    }

    /// Serializes the drawing as ASCII DXF.
    pub fn to_dxf_string(&self) -> String {
        let mut out = String::with_capacity(self.pairs.len() * 12);
        for p in &self.pairs {
            out.push_str(&format!("{:>3}\n{}\n", p.code, p.value));
        }
        out
    }

    /// Writes the drawing to `path` after recording the next free handle in
    /// `$HANDSEED`.
    pub fn write(&mut self, path: &Path) -> Result<()> {
        self.sync_handle_seed();
        write_bytes(path, &self.to_bytes())?;
        Ok(())
    }

    pub fn pairs(&self) -> &[GroupPair] {
        &self.pairs
    }

    /// `$ACADVER`, or `AC1009` when absent.
    pub fn version(&self) -> String {
        self.header_var("$ACADVER")
            .and_then(|v| v.first().map(|p| p.value.clone()))
            .unwrap_or_else(|| "AC1009".into())
    }

    fn uses_subclass_markers(&self) -> bool {
        self.version().as_str() > "AC1009"
    }

    /// Index of the `0 SECTION` pair and of its `0 ENDSEC`.
    fn section(&self, name: &str) -> Option<(usize, usize)> {
        let start = self
            .pairs
            .windows(2)
            .position(|w| w[0].is(0, "SECTION") && w[1].is(2, name))?;
        let end = self.pairs[start..]
            .iter()
            .position(|p| p.is(0, "ENDSEC"))
            .map(|k| start + k)?;
        Some((start, end))
    }

    /// Index before which a new section can be inserted.
    fn eof_index(&self) -> usize {
        self.pairs
            .iter()
            .rposition(|p| p.is(0, "EOF"))
            .unwrap_or(self.pairs.len())
    }

    /// Returns the range of section `name`, inserting an empty one first if
    /// needed. A new section goes before the first existing section listed in
    /// `before`, or before `EOF`.
    fn ensure_section(&mut self, name: &str, before: &[&str]) -> (usize, usize) {
        if let Some(range) = self.section(name) {
            return range;
        }
        let at = before
            .iter()
            .filter_map(|b| self.section(b).map(|(s, _)| s))
            .min()
            .unwrap_or_else(|| self.eof_index());
        self.pairs.splice(
            at..at,
            [pair(0, "SECTION"), pair(2, name), pair(0, "ENDSEC")],
        );
        if !self.pairs.iter().any(|p| p.is(0, "EOF")) {
            self.pairs.push(pair(0, "EOF"));
        }
        (at, at + 2)
    }

    /// Entities of the `ENTITIES` section in file order, paper space included.
    pub fn entities(&self) -> Vec<Entity<'_>> {
        let Some((start, end)) = self.section("ENTITIES") else {
            return Vec::new();
        };
        let body = start + 2;
        let mut out = Vec::new();
        let mut k = body;
        while k < end {
            if self.pairs[k].code != 0 {
                k += 1;
                continue;
            }
            let next = self.pairs[k + 1..end]
                .iter()
                .position(|p| p.code == 0)
                .map_or(end, |n| k + 1 + n);
            out.push(Entity {
                start: k,
                pairs: &self.pairs[k..next],
            });
            k = next;
        }
        out
    }

    /// Locations of model space entities of `kind` on `layer` (case
    /// insensitive layer match).
    pub fn entity_points(&self, kind: EntityKind, layer: &str) -> Result<Vec<Point3>> {
        let mut pts = Vec::new();
        for e in self.entities() {
            if !e.kind().eq_ignore_ascii_case(kind.dxf_name())
                || !e.in_model_space()
                || !e.layer().trim().eq_ignore_ascii_case(layer.trim())
            {
                continue;
            }
            pts.push(e.location()?);
        }
        Ok(pts)
    }

    /// Value pairs of a header variable.
    pub fn header_var(&self, name: &str) -> Option<Vec<GroupPair>> {
        let (start, end) = self.section("HEADER")?;
        let k = (start..end).find(|&k| self.pairs[k].is(9, name))?;
        let values = self.pairs[k + 1..end]
            .iter()
            .take_while(|p| p.code != 9 && p.code != 0)
            .cloned()
            .collect();
        Some(values)
    }

    /// Sets a header variable, replacing its previous value pairs.
    pub fn set_header_var(&mut self, name: &str, values: Vec<GroupPair>) {
        let (start, end) = match self.section("HEADER") {
            Some(range) => range,
            None => {
                self.pairs.splice(
                    0..0,
                    [pair(0, "SECTION"), pair(2, "HEADER"), pair(0, "ENDSEC")],
                );
                (0, 2)
            }
        };
        let existing = (start..end).find(|&k| self.pairs[k].is(9, name));
        if let Some(k) = existing {
            let old = self.pairs[k + 1..end]
                .iter()
                .take_while(|p| p.code != 9 && p.code != 0)
                .count();
            self.pairs.splice(k + 1..k + 1 + old, values);
        } else {
            let mut var = vec![pair(9, name)];
            var.extend(values);
            self.pairs.splice(end..end, var);
        }
    }

    fn allocate_handle(&mut self) -> Option<GroupPair> {
        let h = self.next_handle?;
        self.next_handle = Some(h + 1);
        Some(pair(5, format!("{h:X}")))
    }

    fn sync_handle_seed(&mut self) {
        if let Some(h) = self.next_handle {
            self.set_header_var("$HANDSEED", vec![pair(5, format!("{h:X}"))]);
        }
    }

    /// Range of a `TABLE` inside `TABLES`: index of `0 TABLE` and of its
    /// `0 ENDTAB`.
    fn table(&self, name: &str) -> Option<(usize, usize)> {
        let (start, end) = self.section("TABLES")?;
        let t = (start..end).find(|&k| self.pairs[k].is(0, "TABLE") && self.pairs[k + 1].is(2, name))?;
        let e = (t..end).find(|&k| self.pairs[k].is(0, "ENDTAB"))?;
        Some((t, e))
    }

    /// Returns `true` when table `table` has an entry called `name`.
    pub fn has_table_entry(&self, table: &str, name: &str) -> bool {
        let Some((start, end)) = self.table(table) else {
            return false;
        };
        // entry names are group 2 pairs following a `0 <TABLE>` marker
        let mut in_entry = false;
        for p in &self.pairs[start + 2..end] {
            if p.code == 0 {
                in_entry = p.value.eq_ignore_ascii_case(table);
            } else if in_entry && p.code == 2 && p.value.eq_ignore_ascii_case(name) {
                return true;
            }
        }
        false
    }

    /// Appends an entry to `table`, creating the table and the `TABLES`
    /// section when needed. `attrs` are the pairs after the handle and
    /// subclass markers.
    fn add_table_entry(&mut self, table: &str, subclass: &str, attrs: Vec<GroupPair>) {
        let (t, e) = match self.table(table) {
            Some(range) => range,
            None => {
                let (_, end) = self.ensure_section("TABLES", &["BLOCKS", "ENTITIES", "OBJECTS"]);
                self.pairs.splice(
                    end..end,
                    [pair(0, "TABLE"), pair(2, table), pair(70, 0), pair(0, "ENDTAB")],
                );
                (end, end + 3)
            }
        };
        let mut entry = vec![pair(0, table)];
        entry.extend(self.allocate_handle());
        if self.uses_subclass_markers() {
            entry.push(pair(100, "AcDbSymbolTableRecord"));
            entry.push(pair(100, subclass));
        }
        entry.extend(attrs);
        self.pairs.splice(e..e, entry);
        // bump the entry count of the table header
        let count_at = (t + 2..e)
            .take_while(|&k| self.pairs[k].code != 0)
            .find(|&k| self.pairs[k].code == 70);
        if let Some(k) = count_at {
            let count: u32 = self.pairs[k].value.trim().parse().unwrap_or(0);
            self.pairs[k].value = (count + 1).to_string();
        }
    }

    /// Adds a layer unless one with that name already exists.
    pub fn ensure_layer(&mut self, name: &str, color: i16) {
        if self.has_table_entry("LAYER", name) {
            return;
        }
        self.add_table_entry(
            "LAYER",
            "AcDbLayerTableRecord",
            vec![pair(2, name), pair(70, 0), pair(62, color), pair(6, "CONTINUOUS")],
        );
    }

    /// Adds a text style using `font` unless one with that name exists.
    pub fn ensure_text_style(&mut self, name: &str, font: &str) {
        if self.has_table_entry("STYLE", name) {
            return;
        }
        self.add_table_entry(
            "STYLE",
            "AcDbTextStyleTableRecord",
            vec![
                pair(2, name),
                pair(70, 0),
                pair(40, 0.0),
                pair(41, 1.0),
                pair(50, 0.0),
                pair(71, 0),
                pair(42, 2.5),
                pair(3, font),
                pair(4, ""),
            ],
        );
    }

    /// Starts appending entities. They are collected in memory and spliced
    /// into `ENTITIES` in one step when the writer is dropped.
    pub fn entity_writer(&mut self) -> EntityWriter<'_> {
        let markers = self.uses_subclass_markers();
        EntityWriter {
            doc: self,
            markers,
            pending: Vec::new(),
        }
    }

    pub fn add_point(&mut self, location: Point3, layer: &str, color: i16) {
        self.entity_writer().point(location, layer, color);
    }

    /// Adds single line text centered horizontally on `at`.
    pub fn add_text(&mut self, text: &str, at: Point, height: f64, style: &str, layer: &str, color: i16) {
        self.entity_writer().text(text, at, height, style, layer, color);
    }

    /// Sets `$EXTMIN`/`$EXTMAX` to the bounding box of all entity locations.
    pub fn zoom_extents(&mut self) {
        let mut min = [f64::INFINITY; 3];
        let mut max = [f64::NEG_INFINITY; 3];
        for e in self.entities() {
            if let Ok(p) = e.location() {
                for (k, v) in [p.x, p.y, p.z].into_iter().enumerate() {
                    min[k] = min[k].min(v);
                    max[k] = max[k].max(v);
                }
            }
        }
        if !min[0].is_finite() {
            return;
        }
        self.set_header_var("$EXTMIN", vec![pair(10, min[0]), pair(20, min[1]), pair(30, min[2])]);
        self.set_header_var("$EXTMAX", vec![pair(10, max[0]), pair(20, max[1]), pair(30, max[2])]);
    }
}

/// Buffered entity output for a [`DxfDocument`].
///
/// Handles are taken from the document as entities are added, so the
/// buffered order is the final file order.
pub struct EntityWriter<'a> {
    doc: &'a mut DxfDocument,
    markers: bool,
    pending: Vec<GroupPair>,
}

impl EntityWriter<'_> {
    fn push(&mut self, kind: &str, layer: &str, color: i16, subclass: &str, attrs: Vec<GroupPair>) {
        self.pending.push(pair(0, kind));
        self.pending.extend(self.doc.allocate_handle());
        if self.markers {
            self.pending.push(pair(100, "AcDbEntity"));
        }
        self.pending.push(pair(8, layer));
        self.pending.push(pair(62, color));
        if self.markers {
            self.pending.push(pair(100, subclass));
        }
        self.pending.extend(attrs);
    }

    pub fn point(&mut self, location: Point3, layer: &str, color: i16) {
        self.push(
            "POINT",
            layer,
            color,
            "AcDbPoint",
            vec![pair(10, location.x), pair(20, location.y), pair(30, location.z)],
        );
    }

    /// Single line text centered horizontally on `at`.
    pub fn text(&mut self, text: &str, at: Point, height: f64, style: &str, layer: &str, color: i16) {
        let mut attrs = vec![
            pair(10, at.x),
            pair(20, at.y),
            pair(30, 0.0),
            pair(40, height),
            pair(1, text),
            pair(7, style),
            pair(72, 1),
            pair(11, at.x),
            pair(21, at.y),
            pair(31, 0.0),
        ];
        if self.markers {
            attrs.push(pair(100, "AcDbText"));
            attrs.push(pair(73, 0));
        }
        self.push("TEXT", layer, color, "AcDbText", attrs);
    }
}

impl Drop for EntityWriter<'_> {
    fn drop(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let (_, end) = self.doc.ensure_section("ENTITIES", &["OBJECTS"]);
        self.doc.pairs.splice(end..end, self.pending.drain(..));
    }
}
