use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info};

use crate::config::Settings;
use crate::engine::simulation::RunState;
use crate::error::Result;
use crate::labs::corrosion::CorrosionLab;
use crate::labs::electricity::ElectricityLab;
use crate::labs::enzyme::EnzymeLab;
use crate::labs::geometry::GeometryLab;
use crate::labs::light::LightLab;
use crate::labs::motion::MotionLab;
use crate::labs::panel::LabPanel;
use crate::labs::photosynthesis::PhotosynthesisLab;
use crate::labs::thermodynamics::ThermodynamicsLab;
use crate::labs::Screen;
use crate::ui::home::LAB_COUNT;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tab {
    Home,
    Enzyme,
    Electricity,
    Photosynthesis,
    Thermodynamics,
    Motion,
    Corrosion,
    Geometry,
    Light,
}

impl Tab {
    pub fn all() -> &'static [Tab] {
        &[
            Tab::Home,
            Tab::Enzyme,
            Tab::Electricity,
            Tab::Photosynthesis,
            Tab::Thermodynamics,
            Tab::Motion,
            Tab::Corrosion,
            Tab::Geometry,
            Tab::Light,
        ]
    }

    pub fn title(&self) -> &str {
        match self {
            Tab::Home => " Home ",
            Tab::Enzyme => " Enzymes ",
            Tab::Electricity => " Electricity ",
            Tab::Photosynthesis => " Photosynthesis ",
            Tab::Thermodynamics => " Gas Laws ",
            Tab::Motion => " Motion ",
            Tab::Corrosion => " Corrosion ",
            Tab::Geometry => " Triangles ",
            Tab::Light => " Light ",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Tab::Home => 0,
            Tab::Enzyme => 1,
            Tab::Electricity => 2,
            Tab::Photosynthesis => 3,
            Tab::Thermodynamics => 4,
            Tab::Motion => 5,
            Tab::Corrosion => 6,
            Tab::Geometry => 7,
            Tab::Light => 8,
        }
    }

    /// Lab tab for a zero-based tile on the home screen.
    pub fn for_lab(lab: usize) -> Tab {
        Tab::all().get(lab + 1).copied().unwrap_or(Tab::Home)
    }

    /// Accepts the names used on the command line, e.g. `--lab motion`.
    pub fn from_name(name: &str) -> Option<Tab> {
        match name.to_ascii_lowercase().as_str() {
            "home" => Some(Tab::Home),
            "enzyme" | "enzymes" => Some(Tab::Enzyme),
            "electricity" | "circuits" => Some(Tab::Electricity),
            "photosynthesis" => Some(Tab::Photosynthesis),
            "thermodynamics" | "gas" => Some(Tab::Thermodynamics),
            "motion" | "forces" => Some(Tab::Motion),
            "corrosion" | "rust" => Some(Tab::Corrosion),
            "geometry" | "triangles" => Some(Tab::Geometry),
            "light" | "optics" => Some(Tab::Light),
            _ => None,
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub current_tab: Tab,
    pub selected_lab: usize, // 0-7 for home screen tile selection
    pub enzyme: LabPanel<EnzymeLab>,
    pub electricity: LabPanel<ElectricityLab>,
    pub photosynthesis: LabPanel<PhotosynthesisLab>,
    pub thermodynamics: LabPanel<ThermodynamicsLab>,
    pub motion: LabPanel<MotionLab>,
    pub corrosion: LabPanel<CorrosionLab>,
    pub geometry: LabPanel<GeometryLab>,
    pub light: LabPanel<LightLab>,
}

impl App {
    pub fn new(settings: &Settings) -> Result<Self> {
        let options = settings.sim_options();
        Ok(Self {
            should_quit: false,
            current_tab: Tab::Home,
            selected_lab: 0,
            enzyme: LabPanel::new(EnzymeLab, options)?,
            electricity: LabPanel::new(ElectricityLab, options)?,
            photosynthesis: LabPanel::new(PhotosynthesisLab, options)?,
            thermodynamics: LabPanel::new(ThermodynamicsLab, options)?,
            motion: LabPanel::new(MotionLab, options)?,
            corrosion: LabPanel::new(CorrosionLab, options)?,
            geometry: LabPanel::new(GeometryLab, options)?,
            light: LabPanel::new(LightLab, options)?,
        })
    }

    /// The lab behind the current tab, if any.
    pub fn active_screen(&mut self) -> Option<&mut dyn Screen> {
        match self.current_tab {
            Tab::Home => None,
            Tab::Enzyme => Some(&mut self.enzyme),
            Tab::Electricity => Some(&mut self.electricity),
            Tab::Photosynthesis => Some(&mut self.photosynthesis),
            Tab::Thermodynamics => Some(&mut self.thermodynamics),
            Tab::Motion => Some(&mut self.motion),
            Tab::Corrosion => Some(&mut self.corrosion),
            Tab::Geometry => Some(&mut self.geometry),
            Tab::Light => Some(&mut self.light),
        }
    }

    /// Run state of a lab tab, for the tab bar badges.
    pub fn run_state(&self, tab: Tab) -> Option<RunState> {
        match tab {
            Tab::Home => None,
            Tab::Enzyme => Some(self.enzyme.simulation().run_state()),
            Tab::Electricity => Some(self.electricity.simulation().run_state()),
            Tab::Photosynthesis => Some(self.photosynthesis.simulation().run_state()),
            Tab::Thermodynamics => Some(self.thermodynamics.simulation().run_state()),
            Tab::Motion => Some(self.motion.simulation().run_state()),
            Tab::Corrosion => Some(self.corrosion.simulation().run_state()),
            Tab::Geometry => Some(self.geometry.simulation().run_state()),
            Tab::Light => Some(self.light.simulation().run_state()),
        }
    }

    pub fn on_tick(&mut self, now: Instant) {
        if let Some(screen) = self.active_screen() {
            screen.update(now);
        }
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) {
        // Ctrl+C always quits
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        // Global keys
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                if matches!(self.current_tab, Tab::Home) {
                    self.should_quit = true;
                    return;
                }
            }
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.prev_tab();
                } else {
                    self.next_tab();
                }
                return;
            }
            KeyCode::BackTab => {
                self.prev_tab();
                return;
            }
            KeyCode::Esc => {
                if !matches!(self.current_tab, Tab::Home) {
                    self.switch_to(Tab::Home);
                    return;
                }
            }
            _ => {}
        }

        // Home screen shortcuts and navigation
        if matches!(self.current_tab, Tab::Home) && key.modifiers.is_empty() {
            match key.code {
                KeyCode::Char(c @ '1'..='8') => {
                    let lab = c as usize - '1' as usize;
                    self.selected_lab = lab;
                    self.switch_to(Tab::for_lab(lab));
                }
                // Tiles sit in two rows of four
                KeyCode::Right => self.selected_lab = (self.selected_lab + 1) % LAB_COUNT,
                KeyCode::Left => self.selected_lab = (self.selected_lab + LAB_COUNT - 1) % LAB_COUNT,
                KeyCode::Down | KeyCode::Up => self.selected_lab = (self.selected_lab + 4) % LAB_COUNT,
                KeyCode::Enter => self.switch_to(Tab::for_lab(self.selected_lab)),
                _ => {}
            }
            return;
        }

        // Forward to active lab
        if let Some(screen) = self.active_screen() {
            screen.handle_input(key, now);
        }
    }

    /// Leaving a lab pauses it and cancels its pending tick.
    pub fn switch_to(&mut self, tab: Tab) {
        if tab == self.current_tab {
            return;
        }
        if let Some(screen) = self.active_screen() {
            debug!(lab = screen.title(), "suspend");
            screen.suspend();
        }
        if tab != Tab::Home {
            self.selected_lab = tab.index() - 1;
        }
        info!(from = self.current_tab.title().trim(), to = tab.title().trim(), "switch tab");
        self.current_tab = tab;
    }

    fn next_tab(&mut self) {
        let tabs = Tab::all();
        let idx = self.current_tab.index();
        self.switch_to(tabs[(idx + 1) % tabs.len()]);
    }

    fn prev_tab(&mut self) {
        let tabs = Tab::all();
        let idx = self.current_tab.index();
        self.switch_to(tabs[(idx + tabs.len() - 1) % tabs.len()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use ratatui::layout::Rect;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        App::new(&Settings::default()).unwrap()
    }

    #[test]
    fn digits_open_labs_and_esc_returns_home() {
        let mut app = app();
        let now = Instant::now();
        app.on_key(press(KeyCode::Char('5')), now);
        assert_eq!(app.current_tab, Tab::Motion);
        assert_eq!(app.selected_lab, 4);
        app.on_key(press(KeyCode::Esc), now);
        assert_eq!(app.current_tab, Tab::Home);
        app.on_key(press(KeyCode::Char('8')), now);
        assert_eq!(app.current_tab, Tab::Light);
        app.on_key(press(KeyCode::Esc), now);
        app.on_key(press(KeyCode::Char('q')), now);
        assert!(app.should_quit);
    }

    #[test]
    fn q_inside_a_lab_does_not_quit() {
        let mut app = app();
        app.switch_to(Tab::Geometry);
        app.on_key(press(KeyCode::Char('q')), Instant::now());
        assert!(!app.should_quit);
        app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), Instant::now());
        assert!(app.should_quit);
    }

    #[test]
    fn arrows_walk_the_tile_grid() {
        let mut app = app();
        let now = Instant::now();
        app.on_key(press(KeyCode::Left), now);
        assert_eq!(app.selected_lab, 7);
        app.on_key(press(KeyCode::Right), now);
        assert_eq!(app.selected_lab, 0);
        app.on_key(press(KeyCode::Down), now);
        assert_eq!(app.selected_lab, 4);
        app.on_key(press(KeyCode::Up), now);
        assert_eq!(app.selected_lab, 0);
        app.selected_lab = 3;
        app.on_key(press(KeyCode::Down), now);
        assert_eq!(app.selected_lab, 7);
        app.on_key(press(KeyCode::Enter), now);
        assert_eq!(app.current_tab, Tab::Light);
    }

    #[test]
    fn tab_cycles_through_every_tab() {
        let mut app = app();
        let now = Instant::now();
        for _ in 0..Tab::all().len() {
            app.on_key(press(KeyCode::Tab), now);
        }
        assert_eq!(app.current_tab, Tab::Home);
        app.on_key(press(KeyCode::BackTab), now);
        assert_eq!(app.current_tab, Tab::Light);
    }

    #[test]
    fn leaving_a_running_lab_pauses_it() {
        let mut app = app();
        let t0 = Instant::now();
        app.switch_to(Tab::Enzyme);
        app.enzyme.surface_mut().mount(Rect::new(0, 0, 60, 20));
        app.on_key(press(KeyCode::Char(' ')), t0);
        app.on_tick(t0 + Duration::from_millis(16));
        assert_eq!(app.enzyme.simulation().run_state(), RunState::Running);

        app.on_key(press(KeyCode::Esc), t0);
        assert_eq!(app.enzyme.simulation().run_state(), RunState::Paused);
        assert!(!app.enzyme.simulation().is_tick_pending());
    }

    #[test]
    fn lab_names_resolve() {
        assert_eq!(Tab::from_name("Motion"), Some(Tab::Motion));
        assert_eq!(Tab::from_name("rust"), Some(Tab::Corrosion));
        assert_eq!(Tab::from_name("optics"), Some(Tab::Light));
        assert_eq!(Tab::from_name("chemistry"), None);
        assert_eq!(Tab::for_lab(0), Tab::Enzyme);
        assert_eq!(Tab::for_lab(99), Tab::Home);
    }
}
