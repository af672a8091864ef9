//! Sats Drone entry point
//!
//! On the web this wires the simulation to the page: canvas, DOM panels,
//! input listeners, audio and the leaderboard. Natively it plays a short
//! scripted session headlessly, which is handy for balance tweaks.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, HtmlInputElement, KeyboardEvent, PointerEvent};

    use sats_drone::audio::AudioManager;
    use sats_drone::driver::{FpsCounter, FrameOutput};
    use sats_drone::hud::{HudReadout, diagnostics_line};
    use sats_drone::leaderboard::{Leaderboard, Standings, SupabaseBoard, SupabaseConfig};
    use sats_drone::persistence::LocalStorage;
    use sats_drone::platform::{self, KeyboardAxes, VirtualStick};
    use sats_drone::renderer::CanvasRenderer;
    use sats_drone::settings::{self, Settings};
    use sats_drone::sim::{GameEvent, TickInput, UiEffect, Viewport};
    use sats_drone::{Simulation, Tuning};

    /// How long a radio callout stays on screen (ms)
    const CALLOUT_MS: f64 = 1800.0;

    /// Game instance holding all browser-side state
    struct Game {
        sim: Simulation,
        renderer: CanvasRenderer,
        audio: AudioManager,
        settings: Settings,
        stick: VirtualStick,
        keys: KeyboardAxes,
        fps: FpsCounter,
        last_dt: f32,
        callout: Option<(String, f64)>,
        now: f64,
    }

    impl Game {
        /// Run one animation frame
        fn frame(&mut self, time: f64) {
            self.now = time;
            let input = TickInput {
                control: platform::control_input(&self.stick, &self.keys),
            };
            let out = self.sim.frame(time, &input);
            self.last_dt = out.dt;
            self.fps.record(time);
            self.apply(out);

            if self.callout.as_ref().is_some_and(|(_, until)| *until <= time) {
                self.callout = None;
            }

            let stick = self.stick.active.then_some(&self.stick);
            self.renderer.render(
                &self.sim.snapshot(),
                stick,
                self.settings.quality.starfield_enabled(),
            );
            self.update_hud();
        }

        /// React to everything a frame or lifecycle call produced
        fn apply(&mut self, out: FrameOutput) {
            for effect in &out.ui {
                match effect {
                    UiEffect::Show(panel) => set_hidden(panel.element_id(), false),
                    UiEffect::Hide(panel) => set_hidden(panel.element_id(), true),
                }
            }
            for event in out.events {
                match event {
                    GameEvent::Sound(cue) => self.audio.play(cue),
                    GameEvent::Callout(text) => {
                        self.callout = Some((text, self.now + CALLOUT_MS));
                    }
                    GameEvent::RunEnded { score, wave, combo } => {
                        log::info!("Run ended: score {} wave {} combo {}", score, wave, combo);
                        set_text("final-score", &score.to_string());
                        set_text("final-wave", &wave.to_string());
                        set_text("final-combo", &format!("x{combo}"));
                        submit_run(username_field(), score);
                    }
                    GameEvent::PhaseChanged { .. } | GameEvent::WaveStarted(_) => {}
                }
            }
        }

        /// Push the readout into the HUD elements
        fn update_hud(&self) {
            let callout = self.callout.as_ref().map(|(text, _)| text.as_str());
            let hud = HudReadout::from_world(&self.sim.world).with_callout(callout);

            set_text("hud-score", &hud.score);
            set_text("hud-combo", &hud.combo);
            set_text("hud-wave", &hud.wave);
            set_text("hud-sats", &hud.sats);
            set_text("hud-health", &format!("{:.0}", hud.health));
            set_text("danger-value", &format!("{}%", hud.danger_percent));
            set_style("health-fill", "width", &format!("{:.1}%", hud.health_fraction * 100.0));
            set_style("danger-fill", "width", &format!("{}%", hud.danger_percent));

            set_text("callout", hud.callout.as_deref().unwrap_or(""));
            set_hidden("callout", hud.callout.is_none());

            if self.settings.show_diagnostics {
                set_text("diagnostics", &diagnostics_line(self.fps.fps(), self.last_dt));
            }
            set_hidden("diagnostics", !self.settings.show_diagnostics);
        }

        fn apply_settings(&mut self) {
            let mut tuning = self.sim.tuning.clone();
            self.settings.apply_to(&mut tuning);
            self.sim.set_tuning(tuning);
            self.audio.set_master_volume(self.settings.master_volume);
            self.audio.set_sfx_volume(self.settings.sfx_volume);
            self.audio.set_muted(self.settings.muted);
        }

        fn resize(&mut self, canvas: &HtmlCanvasElement) {
            let Some(window) = web_sys::window() else {
                return;
            };
            let viewport = current_viewport(canvas);
            self.renderer
                .resize(viewport.width, viewport.height, window.device_pixel_ratio());
            self.sim.resize(viewport);
        }
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn set_hidden(id: &str, hidden: bool) {
        if let Some(el) = document().and_then(|d| d.get_element_by_id(id)) {
            let _ = el.class_list().toggle_with_force("hidden", hidden);
        }
    }

    fn set_text(id: &str, text: &str) {
        if let Some(el) = document().and_then(|d| d.get_element_by_id(id)) {
            // Skip identical writes so CSS animations are not retriggered
            if el.text_content().as_deref() != Some(text) {
                el.set_text_content(Some(text));
            }
        }
    }

    fn set_style(id: &str, property: &str, value: &str) {
        if let Some(el) = document()
            .and_then(|d| d.get_element_by_id(id))
            .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok())
        {
            let _ = el.style().set_property(property, value);
        }
    }

    fn username_input() -> Option<HtmlInputElement> {
        document()?
            .get_element_by_id("username")?
            .dyn_into::<HtmlInputElement>()
            .ok()
    }

    fn username_field() -> String {
        username_input().map(|input| input.value()).unwrap_or_default()
    }

    fn current_viewport(canvas: &HtmlCanvasElement) -> Viewport {
        let mut viewport = Viewport::new(canvas.client_width() as f32, canvas.client_height() as f32);
        viewport.coarse_pointer = platform::coarse_pointer();
        viewport.insets = platform::safe_area_insets();
        viewport
    }

    fn leaderboard() -> Leaderboard<LocalStorage, SupabaseBoard> {
        Leaderboard::new(
            LocalStorage,
            SupabaseConfig::from_build_env().map(SupabaseBoard::new),
        )
    }

    /// Submit a finished run, then refresh the standings and personal best
    fn submit_run(username: String, score: u64) {
        wasm_bindgen_futures::spawn_local(async move {
            let board = leaderboard();
            let submission = board.submit_score(&username, score).await;
            let standings = board.fetch_leaderboard().await;
            let best = board.fetch_user_best(&username).await;

            set_text("best-score", &best.best.to_string());
            show_standings(&standings);
            let fallback = submission.fallback || standings.fallback || best.fallback;
            set_hidden("leaderboard-warning", !fallback);
        });
    }

    /// Fill the leaderboard list on the game-over screen
    fn show_standings(standings: &Standings) {
        let Some(doc) = document() else {
            return;
        };
        let Some(list) = doc.get_element_by_id("leaderboard-list") else {
            return;
        };
        list.set_text_content(None);
        for (i, entry) in standings.scores.iter().enumerate() {
            if let Ok(item) = doc.create_element("li") {
                item.set_text_content(Some(&format!(
                    "{}. {}  {}",
                    i + 1,
                    entry.username,
                    entry.score
                )));
                let _ = list.append_child(&item);
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Sats Drone starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        set_hidden("loading", true);

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let store = LocalStorage;
        let prefs = Settings::load(&store);
        let viewport = current_viewport(&canvas);

        let mut renderer = CanvasRenderer::new(canvas.clone()).expect("no 2d context");
        renderer.resize(viewport.width, viewport.height, window.device_pixel_ratio());

        let seed = platform::session_seed();
        let sim = Simulation::new(seed, viewport, Tuning::default());
        log::info!("Game initialized with seed: {}", seed);

        let game = Rc::new(RefCell::new(Game {
            sim,
            renderer,
            audio: AudioManager::new(),
            settings: prefs,
            stick: VirtualStick::default(),
            keys: KeyboardAxes::default(),
            fps: FpsCounter::default(),
            last_dt: 0.0,
            callout: None,
            now: platform::now_ms(),
        }));

        {
            let mut g = game.borrow_mut();
            g.apply_settings();
            let booted = g.sim.boot();
            g.apply(booted);
            if let Some(drone) = settings::load_drone(&store) {
                let chosen = g.sim.choose_drone(&drone);
                g.apply(chosen);
            }
            mark_selected_drone(&g.sim.world.player.drone.id);
        }
        if let Some(input) = username_input() {
            input.set_value(&settings::load_username(&store));
        }

        if leaderboard().needs_warning() {
            log::warn!("No leaderboard backend configured; scores stay on this device");
        }

        setup_pointer(&canvas, game.clone());
        setup_keyboard(game.clone());
        setup_buttons(game.clone());
        setup_drone_select(game.clone());
        setup_window(&canvas, game.clone());

        request_animation_frame(game);

        log::info!("Sats Drone running!");
    }

    fn on<E: wasm_bindgen::convert::FromWasmAbi + 'static>(
        target: &web_sys::EventTarget,
        name: &str,
        handler: impl FnMut(E) + 'static,
    ) {
        let closure = Closure::<dyn FnMut(E)>::new(handler);
        let _ = target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_pointer(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let pos = |e: &PointerEvent| Vec2::new(e.client_x() as f32, e.client_y() as f32);
        {
            let game = game.clone();
            on(canvas, "pointerdown", move |e: PointerEvent| {
                e.prevent_default();
                let mut g = game.borrow_mut();
                g.audio.resume();
                g.stick.begin(pos(&e));
            });
        }
        {
            let game = game.clone();
            on(canvas, "pointermove", move |e: PointerEvent| {
                game.borrow_mut().stick.move_to(pos(&e));
            });
        }
        for name in ["pointerup", "pointercancel", "pointerleave"] {
            let game = game.clone();
            on(canvas, name, move |_e: PointerEvent| {
                game.borrow_mut().stick.end();
            });
        }
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        {
            let game = game.clone();
            on(&window, "keydown", move |e: KeyboardEvent| {
                let mut g = game.borrow_mut();
                if g.keys.set(&e.code(), true) {
                    e.prevent_default();
                    return;
                }
                if e.repeat() {
                    return;
                }
                match e.code().as_str() {
                    "KeyM" => {
                        let muted = g.audio.toggle_mute();
                        g.settings.muted = muted;
                        g.settings.save(&LocalStorage);
                    }
                    "Backquote" => {
                        g.settings.show_diagnostics = !g.settings.show_diagnostics;
                        g.settings.save(&LocalStorage);
                    }
                    _ => {}
                }
            });
        }
        on(&window, "keyup", move |e: KeyboardEvent| {
            game.borrow_mut().keys.set(&e.code(), false);
        });
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let Some(doc) = document() else {
            return;
        };
        if let Some(btn) = doc.get_element_by_id("start-btn") {
            let game = game.clone();
            on(&btn, "click", move |_e: web_sys::MouseEvent| {
                settings::save_username(&LocalStorage, &username_field());
                let mut g = game.borrow_mut();
                g.audio.resume();
                let out = g.sim.start_run();
                g.apply(out);
            });
        }
        if let Some(btn) = doc.get_element_by_id("restart-btn") {
            on(&btn, "click", move |_e: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                let out = g.sim.restart();
                g.apply(out);
                set_hidden("leaderboard-warning", true);
                mark_selected_drone(&g.sim.world.player.drone.id);
            });
        }
    }

    /// Buttons carrying `data-drone="<id>"` pick an archetype
    fn setup_drone_select(game: Rc<RefCell<Game>>) {
        let Some(buttons) = document().and_then(|d| d.query_selector_all("[data-drone]").ok()) else {
            return;
        };
        for i in 0..buttons.length() {
            let Some(btn) = buttons
                .item(i)
                .and_then(|node| node.dyn_into::<web_sys::Element>().ok())
            else {
                continue;
            };
            let Some(id) = btn.get_attribute("data-drone") else {
                continue;
            };
            let game = game.clone();
            on(&btn, "click", move |_e: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                let out = g.sim.choose_drone(&id);
                g.apply(out);
                let chosen = g.sim.world.player.drone.id.clone();
                settings::save_drone(&LocalStorage, &chosen);
                mark_selected_drone(&chosen);
            });
        }
    }

    fn mark_selected_drone(id: &str) {
        let Some(buttons) = document().and_then(|d| d.query_selector_all("[data-drone]").ok()) else {
            return;
        };
        for i in 0..buttons.length() {
            if let Some(btn) = buttons
                .item(i)
                .and_then(|node| node.dyn_into::<web_sys::Element>().ok())
            {
                let selected = btn.get_attribute("data-drone").as_deref() == Some(id);
                let _ = btn.class_list().toggle_with_force("selected", selected);
            }
        }
    }

    fn setup_window(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        {
            let game = game.clone();
            let canvas = canvas.clone();
            on(&window, "resize", move |_e: web_sys::Event| {
                game.borrow_mut().resize(&canvas);
            });
        }
        // Held keys and touches are lost when focus leaves the page
        {
            let game = game.clone();
            on(&window, "blur", move |_e: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                g.keys.clear();
                g.stick.end();
                if g.settings.mute_on_blur {
                    g.audio.set_muted(true);
                }
            });
        }
        on(&window, "focus", move |_e: web_sys::FocusEvent| {
            let mut g = game.borrow_mut();
            let muted = g.settings.muted;
            g.audio.set_muted(muted);
        });
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        game.borrow_mut().frame(time);
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Sats Drone (native) starting...");
    log::info!("Rendering needs a browser - build for wasm32 to play. Running a headless session.");

    let tuning = match std::env::args().nth(1) {
        Some(path) => load_tuning(&path),
        None => sats_drone::Tuning::default(),
    };
    headless::run(tuning);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Read a tuning override file, keeping defaults when it is unusable
#[cfg(not(target_arch = "wasm32"))]
fn load_tuning(path: &str) -> sats_drone::Tuning {
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|json| sats_drone::Tuning::from_json(&json).map_err(|e| e.to_string()));
    match parsed {
        Ok(tuning) => {
            log::info!("Loaded tuning from {}", path);
            tuning
        }
        Err(e) => {
            log::error!("Ignoring tuning file {}: {}", path, e);
            sats_drone::Tuning::default()
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;

    use sats_drone::hud::HudReadout;
    use sats_drone::leaderboard::Leaderboard;
    use sats_drone::persistence::MemoryStore;
    use sats_drone::sim::{ControlInput, GameEvent, GamePhase, TickInput, Viewport};
    use sats_drone::{Simulation, Tuning, platform};

    const DT: f32 = 1.0 / 60.0;
    /// Give up after this much simulated time
    const MAX_SECONDS: f32 = 300.0;

    /// Fly lazy circles until the run ends, then post the score locally
    pub fn run(tuning: Tuning) {
        let seed = platform::session_seed();
        let mut sim = Simulation::new(seed, Viewport::new(960.0, 640.0), tuning);
        log::info!("Headless session with seed: {}", seed);

        sim.boot();
        sim.start_run();

        let mut result = None;
        let mut t = 0.0f32;
        while t < MAX_SECONDS && result.is_none() {
            let heading = t * 0.7;
            let input = TickInput {
                control: ControlInput::new(Vec2::new(heading.cos(), heading.sin()) * 0.8),
            };
            let out = sim.step(DT, &input);
            for event in out.events {
                match event {
                    GameEvent::Callout(text) => log::info!("{}", text),
                    GameEvent::RunEnded { score, wave, combo } => result = Some((score, wave, combo)),
                    _ => {}
                }
            }
            t += DT;
        }

        let hud = HudReadout::from_world(&sim.world);
        println!(
            "{} after {:.1}s: {} | {} | {} | {}",
            sim.phase().as_str(),
            t,
            hud.score,
            hud.wave,
            hud.sats,
            hud.combo
        );

        if sim.phase() != GamePhase::GameOver {
            return;
        }
        let Some((score, wave, combo)) = result else {
            return;
        };
        println!("Run ended on wave {} with combo x{}", wave, combo);

        let board = Leaderboard::local(MemoryStore::new());
        pollster::block_on(board.submit_score("headless", score));
        let standings = pollster::block_on(board.fetch_leaderboard());
        for (i, entry) in standings.scores.iter().enumerate() {
            println!("{:>2}. {:<12} {}", i + 1, entry.username, entry.score);
        }
    }
}
