use crate::app::{Field, Game, Scene};
use crate::model::{Species, STAT_MAX};
use crate::scheduler::Clock;
use crossterm::{
    cursor, execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

const SIDEBAR_W: u16 = 26;
const BAR_W: usize = 16;

/// Palette. The no-color variant sticks to the 16 basic terminal colors.
pub(crate) struct Theme {
    pub(crate) bg: Color,
    pub(crate) panel: Color,
    pub(crate) accent: Color,
    pub(crate) text: Color,
    pub(crate) dim: Color,
    pub(crate) danger: Color,
}

impl Theme {
    pub(crate) fn new(enable_color: bool) -> Self {
        if enable_color {
            Self {
                bg: Color::Rgb { r: 0x0a, g: 0x0a, b: 0x0a },
                panel: Color::Rgb { r: 0x1a, g: 0x1a, b: 0x1a },
                accent: Color::Rgb { r: 0xb4, g: 0x34, b: 0xeb },
                text: Color::White,
                dim: Color::Rgb { r: 0xa0, g: 0xa0, b: 0xa0 },
                danger: Color::Rgb { r: 0xff, g: 0x2e, b: 0x6d },
            }
        } else {
            Self {
                bg: Color::Black,
                panel: Color::Black,
                accent: Color::White,
                text: Color::White,
                dim: Color::Grey,
                danger: Color::White,
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
    pub(crate) bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
            bold: false,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }

    fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    #[cfg(test)]
    pub(crate) fn get(&self, x: u16, y: u16) -> Option<Cell> {
        (x < self.w && y < self.h).then(|| self.cells[self.idx(x, y)])
    }

    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }

    pub(crate) fn fill(&mut self, x0: u16, y0: u16, w: u16, h: u16, bg: Color) {
        for y in y0..y0.saturating_add(h) {
            for x in x0..x0.saturating_add(w) {
                self.set(x, y, Cell { bg, ..Cell::default() });
            }
        }
    }
}

/// Last presented frame plus the one being drawn.
pub(crate) struct Frames {
    prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    full_pass: bool,
}

impl Frames {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            prev: CellBuffer::new(w, h),
            cur: CellBuffer::new(w, h),
            full_pass: true,
        }
    }

    /// Rebuilds both buffers on a size change; the next present repaints everything.
    pub(crate) fn resize(&mut self, w: u16, h: u16) -> bool {
        if w == self.cur.w && h == self.cur.h {
            return false;
        }
        *self = Frames::new(w, h);
        true
    }

    /// Cells to write this frame: all of them after a resize, else only changes.
    pub(crate) fn dirty(&self) -> impl Iterator<Item = (u16, u16, Cell)> + '_ {
        let w = self.cur.w.max(1) as usize;
        self.cur
            .cells
            .iter()
            .zip(&self.prev.cells)
            .enumerate()
            .filter(move |(_, (c, p))| self.full_pass || c != p)
            .map(move |(i, (c, _))| ((i % w) as u16, (i / w) as u16, *c))
    }

    pub(crate) fn commit(&mut self) {
        self.prev.cells.copy_from_slice(&self.cur.cells);
        self.full_pass = false;
    }
}

pub(crate) struct Terminal {
    out: io::Stdout,
    frames: Frames,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            frames: Frames::new(cols, rows),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            ResetColor,
            SetAttribute(Attribute::Reset),
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn canvas(&mut self) -> &mut CellBuffer {
        &mut self.frames.cur
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if !self.frames.resize(c, r) {
            return Ok(false);
        }
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last: Option<(Color, Color, bool)> = None;
        let mut cursor_at: Option<(u16, u16)> = None;

        for (x, y, c) in self.frames.dirty() {
            if cursor_at != Some((x, y)) {
                queue!(self.out, cursor::MoveTo(x, y))?;
            }
            if last != Some((c.fg, c.bg, c.bold)) {
                let weight = if c.bold { Attribute::Bold } else { Attribute::NormalIntensity };
                queue!(
                    self.out,
                    SetAttribute(weight),
                    SetForegroundColor(c.fg),
                    SetBackgroundColor(c.bg)
                )?;
                last = Some((c.fg, c.bg, c.bold));
            }
            queue!(self.out, Print(c.ch))?;
            cursor_at = Some((x + 1, y));
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.frames.commit();
        Ok(())
    }
}

/* -----------------------------
   Text primitives
------------------------------ */

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    draw_styled(buf, x, y, s, fg, bg, false);
}

fn draw_styled(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color, bold: bool) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg, bold });
    }
}

fn draw_centered(buf: &mut CellBuffer, x0: u16, w: u16, y: u16, s: &str, fg: Color, bg: Color, bold: bool) {
    let len = s.chars().count() as u16;
    let x = x0 + w.saturating_sub(len) / 2;
    draw_styled(buf, x, y, s, fg, bg, bold);
}

pub(crate) fn bar(value: u8, width: usize) -> String {
    let v = value.min(STAT_MAX) as usize;
    let fill = (v * width + STAT_MAX as usize / 2) / STAT_MAX as usize;
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    for i in 0..width {
        s.push(if i < fill { '█' } else { '░' });
    }
    s.push(']');
    s
}

fn draw_box(buf: &mut CellBuffer, x0: u16, y0: u16, w: u16, h: u16, border: Color, bg: Color) {
    if w < 2 || h < 2 {
        return;
    }
    buf.fill(x0, y0, w, h, bg);
    let (x1, y1) = (x0 + w - 1, y0 + h - 1);
    let edge = |ch| Cell { ch, fg: border, bg, bold: false };
    for x in x0 + 1..x1 {
        buf.set(x, y0, edge('─'));
        buf.set(x, y1, edge('─'));
    }
    for y in y0 + 1..y1 {
        buf.set(x0, y, edge('│'));
        buf.set(x1, y, edge('│'));
    }
    buf.set(x0, y0, edge('┌'));
    buf.set(x1, y0, edge('┐'));
    buf.set(x0, y1, edge('└'));
    buf.set(x1, y1, edge('┘'));
}

/* -----------------------------
   Portraits
------------------------------ */

pub(crate) fn portrait(species: Species) -> &'static [&'static str] {
    match species {
        Species::Dog => &[
            "  / \\__      ",
            " (    @\\___  ",
            " /         O ",
            "/   (_____/  ",
            "/_____/   U  ",
        ],
        Species::Cat => &[
            "  /\\_/\\    ",
            " ( o.o )   ",
            "  > ^ <    ",
            " /     \\   ",
            "(_______)_/",
        ],
        Species::Rabbit => &[
            " (\\(\\    ",
            " ( -.-)  ",
            " o_(\")(\")",
            "         ",
            "         ",
        ],
        Species::Turtle => &[
            "     _____     ",
            "   /  \\_/  \\ _ ",
            "  |__/ \\__|_O)",
            "   ^^     ^^   ",
            "               ",
        ],
    }
}

fn draw_portrait(buf: &mut CellBuffer, species: Species, cx: u16, y0: u16, fg: Color, bg: Color) {
    let art = portrait(species);
    let w = art.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16;
    let x0 = cx.saturating_sub(w / 2);
    for (i, line) in art.iter().enumerate() {
        draw_text(buf, x0, y0 + i as u16, line, fg, bg);
    }
}

/* -----------------------------
   Screens
------------------------------ */

pub(crate) fn draw_frame<C: Clock>(buf: &mut CellBuffer, game: &Game<C>, theme: &Theme) {
    buf.fill(0, 0, buf.w, buf.h, theme.bg);
    draw_sidebar(buf, game, theme);

    let x0 = SIDEBAR_W.min(buf.w);
    let w = buf.w - x0;
    match &game.scene {
        Scene::Select => draw_select(buf, game, theme, x0, w),
        Scene::Playing => draw_game(buf, game, theme, x0, w),
        Scene::Dead { name } => draw_death(buf, name, theme, x0, w),
    }
}

fn draw_sidebar<C: Clock>(buf: &mut CellBuffer, game: &Game<C>, theme: &Theme) {
    let w = SIDEBAR_W.min(buf.w);
    buf.fill(0, 0, w, buf.h, theme.panel);
    for y in 0..buf.h {
        buf.set(w.saturating_sub(1), y, Cell { ch: '│', fg: theme.accent, bg: theme.panel, bold: false });
    }

    let inner = w.saturating_sub(1);
    draw_centered(buf, 0, inner, 2, "NEO", theme.accent, theme.panel, true);
    draw_centered(buf, 0, inner, 3, "TAMAGOTCHI", theme.accent, theme.panel, true);

    if matches!(game.scene, Scene::Select) {
        return;
    }
    draw_centered(buf, 0, inner, 6, "STATUS", theme.accent, theme.panel, true);
    let rows = [("ENERGY", game.status.hunger), ("MOOD", game.status.boredom)];
    for (i, (label, value)) in rows.iter().enumerate() {
        let y = 8 + i as u16 * 3;
        draw_text(buf, 2, y, &format!("{label}: {value}%"), theme.dim, theme.panel);
        draw_text(buf, 2, y + 1, &bar(*value, BAR_W), theme.accent, theme.panel);
    }
}

fn draw_select<C: Clock>(buf: &mut CellBuffer, game: &Game<C>, theme: &Theme, x0: u16, w: u16) {
    let top = buf.h.saturating_sub(20) / 2;
    draw_centered(buf, x0, w, top, "SELECT YOUR PET", theme.accent, theme.bg, true);

    let selected = game.selected();
    let list_x = x0 + w.saturating_sub(14) / 2;
    for (i, species) in Species::ALL.iter().enumerate() {
        let on = *species == selected;
        let label = format!("{} {}", if on { '>' } else { ' ' }, species.label().to_uppercase());
        let fg = if on { theme.accent } else { theme.text };
        draw_styled(buf, list_x, top + 2 + i as u16, &label, fg, theme.bg, on);
    }

    draw_portrait(buf, selected, x0 + w / 2, top + 7, theme.text, theme.bg);

    let mut name = game.name_edit.clone();
    name.push('_');
    draw_centered(buf, x0, w, top + 14, &format!("PET NAME: {name:<19}"), theme.dim, theme.bg, false);
    draw_centered(buf, x0, w, top + 16, "[ START GAME ]", theme.accent, theme.bg, true);
    draw_centered(
        buf,
        x0,
        w,
        buf.h.saturating_sub(1),
        "↑↓ choose | type name | enter start | esc quit",
        theme.dim,
        theme.bg,
        false,
    );
}

fn draw_game<C: Clock>(buf: &mut CellBuffer, game: &Game<C>, theme: &Theme, x0: u16, w: u16) {
    let (Some(pet), Some(species)) = (game.session.pet(), game.session.species()) else {
        return;
    };
    let top = buf.h.saturating_sub(18) / 2;
    let box_w = 24;
    let bx = x0 + w.saturating_sub(box_w) / 2;
    draw_box(buf, bx, top, box_w, 10, theme.accent, theme.panel);
    draw_centered(buf, bx, box_w, top + 1, &pet.name, theme.accent, theme.panel, true);
    draw_portrait(buf, species, bx + box_w / 2, top + 3, theme.text, theme.panel);

    let controls = [
        (Field::Food, "FOOD AMOUNT", "FEED", &game.food_text),
        (Field::Play, "PLAY TIME", "PLAY", &game.play_text),
    ];
    let ctl_w = 17;
    let gap = 4;
    let cx0 = x0 + w.saturating_sub(ctl_w * 2 + gap) / 2;
    for (i, (field, label, button, text)) in controls.iter().enumerate() {
        let cx = cx0 + i as u16 * (ctl_w + gap);
        let cy = top + 12;
        let focused = game.focus == *field;
        let border = if focused { theme.accent } else { theme.dim };
        draw_box(buf, cx, cy, ctl_w, 5, border, theme.panel);
        draw_centered(buf, cx, ctl_w, cy + 1, label, theme.dim, theme.panel, false);
        draw_centered(buf, cx, ctl_w, cy + 2, &format!("[{text:^5}]"), theme.text, theme.panel, false);
        draw_centered(buf, cx, ctl_w, cy + 3, button, theme.accent, theme.panel, focused);
    }

    draw_centered(
        buf,
        x0,
        w,
        buf.h.saturating_sub(1),
        "f feed | p play | tab switch | enter press | esc menu | q quit",
        theme.dim,
        theme.bg,
        false,
    );
}

fn draw_death(buf: &mut CellBuffer, name: &str, theme: &Theme, x0: u16, w: u16) {
    let y = buf.h.saturating_sub(6) / 2;
    draw_centered(buf, x0, w, y, &format!("Your pet {name}"), theme.danger, theme.bg, true);
    draw_centered(buf, x0, w, y + 1, "is no longer with us", theme.danger, theme.bg, true);
    draw_centered(buf, x0, w, y + 4, "[ RETURN TO MAIN MENU ]", theme.text, theme.bg, false);
}
