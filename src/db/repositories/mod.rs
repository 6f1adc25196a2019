mod heatmap;
mod keystrokes;
mod mouse_metrics;
mod stats;
mod video_calls;
