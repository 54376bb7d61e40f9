//! The platform shell: a winit event loop feeding the input handler, a
//! softbuffer surface presenting the device's pixel buffer, and the frame
//! listener hooks driving the application in between.

use std::{num::NonZeroU32, rc::Rc, time::Instant};

use softbuffer::{Context, Surface};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::{
    device::{InitParams, RenderDevice},
    input::InputHandler,
};

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            title: String::from("swrender"),
            width: 800,
            height: 600,
            clear_color: 0,
        }
    }
}

/// The application callback surface. Use `initialise`/`cleanup` for scene
/// set-up and teardown rather than constructors, so the device exists when
/// they run.
pub trait FrameListener {
    fn initialise(&mut self, device: &mut RenderDevice);

    fn cleanup(&mut self, _device: &mut RenderDevice) {}

    fn on_frame_start(
        &mut self,
        _device: &mut RenderDevice,
        _input: &InputHandler,
        _frame_delta: f32,
    ) {
    }

    fn render(&mut self, device: &mut RenderDevice, frame_delta: f32);

    fn on_frame_end(&mut self, _frame_delta: f32) {}
}

struct Graphics {
    window: Rc<Window>,
    surface: Surface<Rc<Window>, Rc<Window>>,
    device: RenderDevice,
}

impl Graphics {
    fn new(event_loop: &ActiveEventLoop, settings: &AppSettings) -> Self {
        let attributes = Window::default_attributes()
            .with_title(settings.title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(settings.width, settings.height))
            .with_resizable(false);
        let window = Rc::new(
            event_loop
                .create_window(attributes)
                .expect("Failed to create the window"),
        );

        let context = Context::new(window.clone()).expect("Failed to create a softbuffer context");
        let surface =
            Surface::new(&context, window.clone()).expect("Failed to create a softbuffer surface");

        let device = RenderDevice::new(InitParams {
            buffer_width: settings.width,
            buffer_height: settings.height,
            ..Default::default()
        })
        .expect("Failed to initialise the render device");

        Graphics {
            window,
            surface,
            device,
        }
    }
}

pub struct App {
    settings: AppSettings,
    graphics: Option<Graphics>,
    input: InputHandler,
    listener: Box<dyn FrameListener>,
    last_frame: Option<Instant>,
    frames_this_second: u32,
    fps_window_start: Option<Instant>,
}

impl App {
    /// Run the event loop until the window closes or escape is pressed.
    pub fn run(settings: AppSettings, listener: Box<dyn FrameListener>) {
        let event_loop = EventLoop::new().expect("Failed to create the event loop");
        // Poll continuously, this is a rendering loop rather than a widget
        // application.
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App {
            settings,
            graphics: None,
            input: InputHandler::new(),
            listener,
            last_frame: None,
            frames_this_second: 0,
            fps_window_start: None,
        };
        event_loop.run_app(&mut app).expect("Event loop failed");
    }

    fn render_frame(&mut self) {
        let Some(gfx) = self.graphics.as_mut() else {
            return;
        };

        let now = Instant::now();
        let frame_delta = self
            .last_frame
            .map(|last| now.duration_since(last).as_secs_f32())
            .unwrap_or(0.);
        self.last_frame = Some(now);

        gfx.device.clear_back_buffer(self.settings.clear_color);
        gfx.device.clear_z_buffer();

        self.listener
            .on_frame_start(&mut gfx.device, &self.input, frame_delta);
        self.listener.render(&mut gfx.device, frame_delta);

        // Blit the finished pixel buffer onto the window surface.
        let size = gfx.window.inner_size();
        if let (Some(width), Some(height)) =
            (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        {
            gfx.surface
                .resize(width, height)
                .expect("Failed to resize the softbuffer surface");
            let mut buffer = gfx
                .surface
                .buffer_mut()
                .expect("Failed to get the softbuffer buffer");

            let device_pixels = gfx.device.pixels();
            let copy_width = gfx.device.buffer_width().min(size.width) as usize;
            let copy_height = gfx.device.buffer_height().min(size.height) as usize;
            for row in 0..copy_height {
                let src = row * gfx.device.buffer_width() as usize;
                let dst = row * size.width as usize;
                buffer[dst..dst + copy_width]
                    .copy_from_slice(&device_pixels[src..src + copy_width]);
            }

            buffer
                .present()
                .expect("Failed to present the softbuffer buffer");
        }

        self.listener.on_frame_end(frame_delta);
        self.input.end_frame();

        // Fold the frame into a once-a-second FPS readout on the title bar.
        self.frames_this_second += 1;
        let window_start = *self.fps_window_start.get_or_insert(now);
        if now.duration_since(window_start).as_secs_f32() >= 1. {
            let stats = gfx.device.stats();
            gfx.window.set_title(&format!(
                "{} | {} fps | tris {}/{} drawn, {} culled",
                self.settings.title,
                self.frames_this_second,
                stats.drawn,
                stats.submitted,
                stats.culled,
            ));
            gfx.device.reset_stats_counters();
            self.frames_this_second = 0;
            self.fps_window_start = Some(now);
        }

        gfx.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let mut gfx = Graphics::new(event_loop, &self.settings);
        self.listener.initialise(&mut gfx.device);
        self.graphics = Some(gfx);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(gfx) = self.graphics.as_mut() {
                    self.listener.cleanup(&mut gfx.device);
                }
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => {
                if key == KeyCode::Escape && state == ElementState::Pressed {
                    if let Some(gfx) = self.graphics.as_mut() {
                        self.listener.cleanup(&mut gfx.device);
                    }
                    event_loop.exit();
                    return;
                }
                self.input.set_key(key, state == ElementState::Pressed);
            }
            WindowEvent::MouseInput { button, state, .. } => {
                let down = state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.input.set_left_mouse(down),
                    MouseButton::Middle => self.input.set_middle_mouse(down),
                    MouseButton::Right => self.input.set_right_mouse(down),
                    _ => (),
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.set_cursor(Some((position.x, position.y)));
            }
            WindowEvent::CursorLeft { .. } => {
                self.input.set_cursor(None);
            }
            WindowEvent::RedrawRequested => {
                self.render_frame();
            }
            _ => (),
        }
    }
}
