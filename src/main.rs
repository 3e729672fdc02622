//! Ball Drop entry point
//!
//! In the browser: wires DOM events into [`ball_drop::Game`], drives the
//! frame loop and hands snapshots to the JS renderer and HUD.
//! Natively: a headless autoplay that logs how a few turns go.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, PointerEvent};

    use ball_drop::projection::Viewport;
    use ball_drop::{Game, HudSnapshot, platform};

    // Renderer hook; the page installs `window.renderFrame`
    #[wasm_bindgen(inline_js = "
        export function render_frame(json) {
            if (typeof window.renderFrame === 'function') {
                window.renderFrame(JSON.parse(json));
            }
        }
    ")]
    extern "C" {
        fn render_frame(json: &str);
    }

    /// Browser-side session wrapper
    struct App {
        game: Game,
        canvas: HtmlCanvasElement,
        document: Document,
        tuning_json: Option<String>,
        last_time: f64,
        last_hud: Option<HudSnapshot>,
        running: bool,
    }

    impl App {
        /// Canvas rectangle in client pixels, matching pointer event coordinates
        fn viewport(&self) -> Viewport {
            let rect = self.canvas.get_bounding_client_rect();
            Viewport::new(
                rect.left() as f32,
                rect.top() as f32,
                rect.width() as f32,
                rect.height() as f32,
            )
        }

        fn sync_canvas_size(&mut self) {
            let dpr = web_sys::window()
                .map(|w| w.device_pixel_ratio())
                .unwrap_or(1.0);
            let w = (self.canvas.client_width() as f64 * dpr) as u32;
            let h = (self.canvas.client_height() as f64 * dpr) as u32;
            self.canvas.set_width(w);
            self.canvas.set_height(h);
            let viewport = self.viewport();
            self.game.resize(viewport);
        }

        fn restart(&mut self) {
            let seed = platform::session_seed();
            self.game = Game::with_tuning_json(self.tuning_json.as_deref(), seed);
            self.sync_canvas_size();
            self.last_hud = None;
            self.last_time = 0.0;
            log::info!("Game restarted with seed: {}", seed);
        }

        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }

        fn set_hidden(&self, id: &str, hidden: bool) {
            if let Some(el) = self.document.get_element_by_id(id) {
                let _ = el.set_attribute("class", if hidden { "hidden" } else { "" });
            }
        }

        /// Push HUD values into the DOM when they change
        fn update_hud(&mut self) {
            let hud = self.game.hud();
            if self.last_hud == Some(hud) {
                return;
            }

            self.set_text("hud-score", &hud.score.to_string());
            self.set_text("hud-balls", &hud.projectile_count.to_string());
            self.set_text("hud-turn", &hud.turn.to_string());
            self.set_hidden("turbo-btn", !hud.turn_in_progress);
            self.set_hidden("end-turn-btn", !hud.turn_in_progress);
            if let Some(btn) = self.document.get_element_by_id("turbo-btn") {
                let class = match (hud.turn_in_progress, hud.is_turbo) {
                    (false, _) => "hidden",
                    (true, true) => "active",
                    (true, false) => "",
                };
                let _ = btn.set_attribute("class", class);
            }
            self.set_hidden("pause-menu", !hud.is_paused);
            self.set_hidden("game-over", !hud.is_game_over);
            if let Some(score) = hud.final_score {
                self.set_text("final-score", &score.to_string());
            }

            self.last_hud = Some(hud);
        }

        fn render(&self) {
            match self.game.render_snapshot().to_json() {
                Ok(json) => render_frame(&json),
                Err(e) => log::warn!("Render snapshot failed: {}", e),
            }
        }
    }

    /// Optional balance overrides from `<script id="tuning" type="application/json">`
    fn read_tuning_json(document: &Document) -> Option<String> {
        document
            .get_element_by_id("tuning")
            .and_then(|el| el.text_content())
            .filter(|text| !text.trim().is_empty())
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("logger init failed: {}", e).into());
        }

        log::info!("Ball Drop starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        let tuning_json = read_tuning_json(&document);
        let seed = platform::session_seed();
        let game = Game::with_tuning_json(tuning_json.as_deref(), seed);
        log::info!("Game initialized with seed: {}", seed);

        let app = Rc::new(RefCell::new(App {
            game,
            canvas: canvas.clone(),
            document,
            tuning_json,
            last_time: 0.0,
            last_hud: None,
            running: true,
        }));
        app.borrow_mut().sync_canvas_size();

        setup_pointer_handlers(&canvas, app.clone());
        setup_keyboard(app.clone());
        setup_buttons(app.clone());
        setup_resize(app.clone());

        request_animation_frame(app);

        log::info!("Ball Drop running!");
        Ok(())
    }

    fn setup_pointer_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                // Keep receiving the release even if it happens off the canvas
                let _ = canvas_clone.set_pointer_capture(event.pointer_id());
                app.borrow_mut()
                    .game
                    .pointer_down(event.client_x() as f32, event.client_y() as f32);
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                app.borrow_mut()
                    .game
                    .pointer_move(event.client_x() as f32, event.client_y() as f32);
            });
            let _ = canvas
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                app.borrow_mut()
                    .game
                    .pointer_up(event.client_x() as f32, event.client_y() as f32);
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch gestures taken over by the browser never send a pointerup
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                if app.borrow_mut().game.cancel_aim() {
                    log::debug!("Aim cancelled by pointercancel");
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("pointercancel", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_keyboard(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            let mut a = app.borrow_mut();
            match event.key().as_str() {
                "Escape" => {
                    if !a.game.cancel_aim() {
                        a.game.toggle_pause();
                    }
                }
                "t" | "T" => {
                    a.game.toggle_turbo();
                }
                "p" | "P" => {
                    a.game.toggle_pause();
                }
                _ => {}
            }
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn on_click(app: &Rc<RefCell<App>>, id: &str, action: fn(&mut App)) {
        let Some(btn) = app.borrow().document.get_element_by_id(id) else {
            return;
        };
        let app = app.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            action(&mut app.borrow_mut());
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(app: Rc<RefCell<App>>) {
        on_click(&app, "turbo-btn", |a| {
            a.game.toggle_turbo();
        });
        on_click(&app, "pause-btn", |a| {
            a.game.toggle_pause();
        });
        on_click(&app, "resume-btn", |a| {
            if a.game.is_paused() {
                a.game.toggle_pause();
            }
        });
        on_click(&app, "end-turn-btn", |a| {
            a.game.force_end_turn();
        });

        // Restart also revives a stopped frame loop
        let Some(btn) = app.borrow().document.get_element_by_id("restart-btn") else {
            return;
        };
        let app = app.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            let restart_loop = {
                let mut a = app.borrow_mut();
                a.restart();
                let stopped = !a.running;
                a.running = true;
                stopped
            };
            if restart_loop {
                request_animation_frame(app.clone());
            }
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::UiEvent| {
            app.borrow_mut().sync_canvas_size();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        let keep_running = {
            let mut a = app.borrow_mut();

            let dt = if a.last_time > 0.0 {
                (time - a.last_time) / 1000.0
            } else {
                1.0 / 60.0
            };
            a.last_time = time;

            a.game.frame(dt);
            a.render();
            a.update_hud();

            if a.game.is_game_over() {
                log::info!("Game over - frame loop stopped");
                a.running = false;
            }
            a.running
        };

        if keep_running {
            request_animation_frame(app);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main
}

/// Headless autoplay: fire a fan of shots, one per turn
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use ball_drop::Game;
    use ball_drop::projection::Viewport;
    use ball_drop::sim::tick::SimEvent;

    env_logger::init();
    log::info!("Ball Drop (native) starting...");
    log::info!("Native mode is a headless autoplay - serve the wasm build for the web version");

    let turns: u32 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(10);
    let seed = ball_drop::platform::session_seed();

    let mut game = Game::new(ball_drop::Tuning::default(), seed);
    let viewport = Viewport::new(0.0, 0.0, 800.0, 1200.0);
    game.resize(viewport);

    const FRAME: f64 = 1.0 / 60.0;
    const MAX_FRAMES_PER_TURN: u32 = 60 * 120;

    for shot in 0..turns {
        if game.is_game_over() {
            break;
        }

        // Sweep the pull point across the lower half of the canvas
        let cx = viewport.width / 2.0;
        let cy = viewport.height / 2.0;
        let sweep = ((shot as f32 * 0.7).sin()) * viewport.width * 0.3;
        game.pointer_down(cx, cy);
        game.pointer_move(cx - sweep, cy + 200.0);
        game.pointer_up(cx - sweep, cy + 200.0);

        let mut frames = 0;
        let mut hits = 0;
        while game.hud().turn_in_progress {
            if frames == 60 * 10 {
                game.toggle_turbo();
            }
            for event in game.frame(FRAME) {
                if matches!(
                    event,
                    SimEvent::BlockDamaged { .. } | SimEvent::BlockDestroyed { .. }
                ) {
                    hits += 1;
                }
            }
            frames += 1;
            if frames >= MAX_FRAMES_PER_TURN {
                log::warn!("Turn {} took too long, ending it", game.hud().turn);
                game.force_end_turn();
            }
        }

        let hud = game.hud();
        log::info!(
            "After shot {}: turn {}, score {}, balls {}, {} block hit(s) in {} frames",
            shot + 1,
            hud.turn,
            hud.score,
            hud.projectile_count,
            hits,
            frames
        );
    }

    let hud = game.hud();
    match hud.final_score {
        Some(score) => println!("Game over on turn {} with score {}", hud.turn, score),
        None => println!("Stopped on turn {} with score {}", hud.turn, hud.score),
    }
}
