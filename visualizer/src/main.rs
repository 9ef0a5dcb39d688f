use cavecore::geometry::heading::compass_point;
use cavecore::geometry::{Point2D, Rect};
use cavecore::mapping::{fit_to_view, DEFAULT_MARGIN};
use cavecore::survey::{SessionSnapshot, Waypoint};
use iced::{
    mouse, time,
    widget::{
        button,
        canvas::{self, Canvas, Frame, Geometry, Path, Stroke},
        column, row, scrollable, text, text_input, Column, Container,
    },
    Alignment, Color, Element, Length, Pixels, Point, Rectangle, Renderer, Subscription, Task,
    Theme,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MARKER_RADIUS: f32 = 5.0;

fn main() -> iced::Result {
    iced::application(Visualizer::boot, Visualizer::update, Visualizer::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Visualizer) -> String {
    "Cave Survey Stick Map".into()
}

fn application_subscription(_: &Visualizer) -> Subscription<Message> {
    time::every(Duration::from_secs(1)).map(|_| Message::Tick)
}

fn application_theme(_: &Visualizer) -> Theme {
    Theme::Dark
}

#[derive(Debug)]
struct Visualizer {
    config: ScenarioForm,
    payload: Option<MapPayload>,
    status: String,
    history: Vec<String>,
}

#[derive(Debug, Clone)]
enum Message {
    Tick,
    PayloadFetched(Result<MapPayload, String>),
    ConfigFieldChanged(ConfigField, String),
    SubmitConfig,
    ConfigSubmitted(Result<String, String>),
}

#[derive(Debug, Clone, Copy)]
enum ConfigField {
    HighThreshold,
    LowThreshold,
    WheelCircumference,
    Noise,
    Seed,
    Description,
}

impl Visualizer {
    fn boot() -> (Self, Task<Message>) {
        (
            Visualizer {
                config: ScenarioForm::default(),
                payload: None,
                status: "Waiting for survey data...".into(),
                history: Vec::new(),
            },
            Task::perform(fetch_payload(), Message::PayloadFetched),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => Task::perform(fetch_payload(), Message::PayloadFetched),
            Message::PayloadFetched(Ok(payload)) => {
                let previous = state
                    .payload
                    .as_ref()
                    .map(|payload| payload.snapshot.waypoints.len());
                state.status = format!(
                    "Survey: {} revolutions / {:.2} m",
                    payload.snapshot.revolutions, payload.snapshot.distance_m
                );
                if previous != Some(payload.snapshot.waypoints.len()) {
                    state.push_history(format!(
                        "Map: {} waypoints, {} stations",
                        payload.snapshot.waypoints.len(),
                        payload.stations.len()
                    ));
                }
                state.payload = Some(payload);
                Task::none()
            }
            Message::PayloadFetched(Err(err)) => {
                state.status = format!("Bridge error: {err}");
                Task::none()
            }
            Message::ConfigFieldChanged(field, value) => {
                state.config.update_field(field, value);
                Task::none()
            }
            Message::SubmitConfig => {
                let payload = state.config.to_payload();
                Task::perform(post_config(payload), Message::ConfigSubmitted)
            }
            Message::ConfigSubmitted(Ok(message)) => {
                state.status = message;
                state.push_history("Scenario submitted".into());
                Task::none()
            }
            Message::ConfigSubmitted(Err(err)) => {
                state.status = format!("Scenario error: {err}");
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let snapshot = state
            .payload
            .as_ref()
            .map(|payload| payload.snapshot.clone())
            .unwrap_or_default();

        let config_column = column![
            text("Survey Scenario").size(26),
            text_input("High threshold", &state.config.high_threshold)
                .on_input(|value| Message::ConfigFieldChanged(ConfigField::HighThreshold, value))
                .padding(6),
            text_input("Low threshold", &state.config.low_threshold)
                .on_input(|value| Message::ConfigFieldChanged(ConfigField::LowThreshold, value))
                .padding(6),
            text_input("Wheel circumference (cm)", &state.config.wheel_circumference)
                .on_input(|value| {
                    Message::ConfigFieldChanged(ConfigField::WheelCircumference, value)
                })
                .padding(6),
            text_input("Noise (µT)", &state.config.noise)
                .on_input(|value| Message::ConfigFieldChanged(ConfigField::Noise, value))
                .padding(6),
            text_input("Seed", &state.config.seed)
                .on_input(|value| Message::ConfigFieldChanged(ConfigField::Seed, value))
                .padding(6),
            text_input("Description", &state.config.description)
                .on_input(|value| Message::ConfigFieldChanged(ConfigField::Description, value))
                .padding(6),
            button("POST scenario")
                .on_press(Message::SubmitConfig)
                .padding(10),
            text(&state.status).size(14),
            column![
                text("Parameter definitions").size(16),
                text("High threshold: magnitude an armed detector must exceed to count a magnet pass.")
                    .size(12),
                text("Low threshold: magnitude the field must drop below before the next pass counts.")
                    .size(12),
                text("Wheel circumference: distance walked per revolution.").size(12),
                text("Noise: generator noise amplitude on the field magnitude.").size(12),
                text("Seed: deterministic PRNG seeding so scenarios replay consistently.")
                    .size(12),
                text("Description: free-text note echoed by the bridge.").size(12),
            ]
            .spacing(4)
            .padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(360.0));

        let heading_line = match snapshot.heading {
            Some(heading) => text(format!(
                "Heading {:.2}° {}",
                heading.magnetic,
                compass_point(heading.magnetic)
            )),
            None => text("Heading not available"),
        }
        .size(16);

        let detector_line = text(format!(
            "{} | {} | revolutions {} | magnitude {:.2} µT | distance {:.2} m",
            if snapshot.running {
                "Detecting magnet"
            } else {
                "Stopped"
            },
            if snapshot.armed { "armed" } else { "holding" },
            snapshot.revolutions,
            snapshot.current_magnitude,
            snapshot.distance_m
        ))
        .size(16);

        let calibration_line = if snapshot.calibration_needed {
            text("Compass calibration needed: move the device in a figure-eight.").size(14)
        } else {
            text("Compass accuracy OK").size(14)
        };

        let magnitude_plot = Canvas::new(MagnitudePlot {
            data: snapshot.history.clone(),
            high: snapshot.settings.high_threshold,
            low: snapshot.settings.low_threshold,
        })
        .width(Length::Fill)
        .height(Length::Fixed(160.0));

        let stick_map = Canvas::new(StickMap::from_payload(state.payload.as_ref()))
            .width(Length::Fill)
            .height(Length::Fixed(360.0));

        let waypoint_entries = if snapshot.waypoints.is_empty() {
            Column::new().push(text("No waypoints recorded").size(12))
        } else {
            snapshot.waypoints.iter().rev().take(8).fold(
                Column::new().spacing(4),
                |col, waypoint: &Waypoint| {
                    col.push(
                        text(format!(
                            "#{}: {:.2} m @ {:.2}° | depth {:.1} m | {}",
                            waypoint.sequence_number,
                            waypoint.distance,
                            waypoint.heading,
                            waypoint.depth,
                            waypoint.source_kind
                        ))
                        .size(12),
                    )
                },
            )
        };

        let history_list = if state.history.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.clone()).size(12))
                })
        };

        let survey_column = column![
            text("Survey").size(26),
            heading_line,
            detector_line,
            calibration_line,
            text("Magnetic field magnitude").size(18),
            magnitude_plot,
            text("Stick map (north up)").size(18),
            stick_map,
            text("Recent waypoints").size(16),
            Container::new(waypoint_entries).padding(6),
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(90.0))).padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fill);

        let layout = row![config_column, survey_column]
            .spacing(20)
            .align_y(Alignment::Start)
            .padding(20);

        Container::new(scrollable(layout))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}

async fn fetch_payload() -> Result<MapPayload, String> {
    let response = reqwest::get("http://127.0.0.1:9000/map")
        .await
        .map_err(|e| e.to_string())?;
    response
        .json::<MapPayload>()
        .await
        .map_err(|e| e.to_string())
}

async fn post_config(config: ScenarioConfig) -> Result<String, String> {
    let client = reqwest::Client::new();
    let response = client
        .post("http://127.0.0.1:9000/ingest-config")
        .json(&config)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if response.status().is_success() {
        Ok("Scenario submitted".into())
    } else {
        let status = response.status();
        let text = response.text().await.unwrap_or_else(|_| "".into());
        Err(format!("{}: {}", status, text))
    }
}

#[derive(Debug, Clone)]
struct ScenarioForm {
    high_threshold: String,
    low_threshold: String,
    wheel_circumference: String,
    noise: String,
    seed: String,
    description: String,
}

impl ScenarioForm {
    fn default() -> Self {
        Self {
            high_threshold: "1170".into(),
            low_threshold: "1000".into(),
            wheel_circumference: "11.78".into(),
            noise: "25".into(),
            seed: "312".into(),
            description: "Visualizer loop survey".into(),
        }
    }

    fn update_field(&mut self, field: ConfigField, value: String) {
        match field {
            ConfigField::HighThreshold => self.high_threshold = value,
            ConfigField::LowThreshold => self.low_threshold = value,
            ConfigField::WheelCircumference => self.wheel_circumference = value,
            ConfigField::Noise => self.noise = value,
            ConfigField::Seed => self.seed = value,
            ConfigField::Description => self.description = value,
        }
    }

    fn to_payload(&self) -> ScenarioConfig {
        ScenarioConfig {
            settings: ScenarioSettings {
                high_threshold: self.high_threshold.parse().ok(),
                low_threshold: self.low_threshold.parse().ok(),
                wheel_circumference_cm: self.wheel_circumference.parse().ok(),
            },
            generator: ScenarioGenerator {
                noise: self.noise.parse().ok(),
                seed: self.seed.parse().ok(),
                description: if self.description.trim().is_empty() {
                    None
                } else {
                    Some(self.description.clone())
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ScenarioConfig {
    settings: ScenarioSettings,
    generator: ScenarioGenerator,
}

#[derive(Debug, Serialize)]
struct ScenarioSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    high_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    low_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wheel_circumference_cm: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ScenarioGenerator {
    #[serde(skip_serializing_if = "Option::is_none")]
    noise: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct StationPayload {
    position: Point2D,
    depth: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct MapPayload {
    #[serde(default)]
    snapshot: SessionSnapshot,
    #[serde(default)]
    origin: Point2D,
    #[serde(default)]
    polyline: Vec<Point2D>,
    bounding_box: Rect,
    #[serde(default)]
    stations: Vec<StationPayload>,
}

#[derive(Clone)]
struct MagnitudePlot {
    data: Vec<f64>,
    high: f64,
    low: f64,
}

impl canvas::Program<Message> for MagnitudePlot {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.05, 0.05, 0.05),
        );

        let min = self
            .data
            .iter()
            .cloned()
            .fold(self.low, f64::min)
            .min(0.0);
        let max = self.data.iter().cloned().fold(self.high, f64::max);
        let range = (max - min).max(1.0);
        let to_y = |value: f64| bounds.height - ((value - min) / range) as f32 * bounds.height;

        for (level, color) in [
            (self.high, Color::from_rgb(0.85, 0.3, 0.3)),
            (self.low, Color::from_rgb(0.3, 0.75, 0.4)),
        ] {
            let y = to_y(level);
            let line = Path::line(Point::new(0.0, y), Point::new(bounds.width, y));
            frame.stroke(&line, Stroke::default().with_width(1.0).with_color(color));
        }

        if self.data.len() > 1 {
            let step = bounds.width / (self.data.len() as f32 - 1.0);
            let path = Path::new(|builder| {
                for (i, value) in self.data.iter().enumerate() {
                    let point = Point::new(i as f32 * step, to_y(*value));
                    if i == 0 {
                        builder.move_to(point);
                    } else {
                        builder.line_to(point);
                    }
                }
            });

            frame.stroke(
                &path,
                Stroke::default()
                    .with_width(2.5)
                    .with_color(Color::from_rgb(0.18, 0.72, 0.89)),
            );
        }

        vec![frame.into_geometry()]
    }
}

#[derive(Clone)]
struct StickMap {
    origin: Point2D,
    polyline: Vec<Point2D>,
    bounding_box: Rect,
    stations: Vec<StationPayload>,
}

impl StickMap {
    fn from_payload(payload: Option<&MapPayload>) -> Self {
        match payload {
            Some(payload) => Self {
                origin: payload.origin,
                polyline: payload.polyline.clone(),
                bounding_box: payload.bounding_box,
                stations: payload.stations.clone(),
            },
            None => Self {
                origin: Point2D::ORIGIN,
                polyline: Vec::new(),
                bounding_box: Rect::at(Point2D::ORIGIN),
                stations: Vec::new(),
            },
        }
    }
}

fn label(frame: &mut Frame, content: String, position: Point, color: Color) {
    frame.fill_text(canvas::Text {
        content,
        position,
        color,
        size: Pixels(12.0),
        ..canvas::Text::default()
    });
}

impl canvas::Program<Message> for StickMap {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.02, 0.02, 0.04),
        );

        if self.polyline.is_empty() {
            label(
                &mut frame,
                "No data available to draw the map".into(),
                Point::new(12.0, bounds.height / 2.0),
                Color::from_rgb(0.6, 0.6, 0.6),
            );
            return vec![frame.into_geometry()];
        }

        let fit = fit_to_view(
            &self.bounding_box,
            bounds.width as f64,
            bounds.height as f64,
            DEFAULT_MARGIN,
        );
        let to_screen = |point: Point2D| {
            let mapped = fit.apply(point);
            Point::new(mapped.x as f32, mapped.y as f32)
        };

        let start = to_screen(self.origin);
        let path = Path::new(|builder| {
            builder.move_to(start);
            for point in &self.polyline {
                builder.line_to(to_screen(*point));
            }
        });
        frame.stroke(
            &path,
            Stroke::default()
                .with_width(2.0)
                .with_color(Color::from_rgb(0.25, 0.5, 0.95)),
        );

        let green = Color::from_rgb(0.2, 0.8, 0.3);
        frame.fill(&Path::circle(start, MARKER_RADIUS), green);
        label(
            &mut frame,
            "Start".into(),
            Point::new(start.x, start.y - 18.0),
            green,
        );

        if let Some(end) = self.polyline.last().copied().map(to_screen) {
            let red = Color::from_rgb(0.9, 0.25, 0.2);
            frame.fill(&Path::circle(end, MARKER_RADIUS), red);
            label(&mut frame, "End".into(), Point::new(end.x, end.y - 18.0), red);
        }

        for station in &self.stations {
            let position = to_screen(station.position);
            label(
                &mut frame,
                format!("{:.1} m", station.depth),
                Point::new(position.x + 6.0, position.y),
                Color::WHITE,
            );
        }

        vec![frame.into_geometry()]
    }
}
