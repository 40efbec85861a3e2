use std::fs;
use std::path::Path;

use maud::{html, Markup, PreEscaped, DOCTYPE};
use plotly::Plot;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.12.1.min.js";

/// A titled block of markup and plots.
pub struct ReportSection {
    title: String,
    content: Vec<Markup>,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        ReportSection {
            title: title.to_string(),
            content: Vec::new(),
        }
    }

    pub fn add_content(&mut self, content: Markup) {
        self.content.push(content);
    }

    /// Embed a Plotly figure; ids are derived from the section title.
    pub fn add_plot(&mut self, plot: Plot) {
        let id = format!(
            "{}-plot-{}",
            self.title.to_lowercase().replace(' ', "-"),
            self.content.len()
        );
        self.content.push(html! {
            div class="plot" { (PreEscaped(plot.to_inline_html(Some(id.as_str())))) }
        });
    }

    fn render(&self) -> Markup {
        html! {
            section {
                h2 { (self.title) }
                @for block in &self.content {
                    (block)
                }
            }
        }
    }
}

/// Standalone HTML report.
pub struct Report {
    software_name: String,
    version: String,
    logo: Option<String>,
    title: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(software_name: &str, version: &str, logo: Option<&str>, title: &str) -> Self {
        Report {
            software_name: software_name.to_string(),
            version: version.to_string(),
            logo: logo.map(str::to_string),
            title: title.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn render(&self) -> Markup {
        let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src=(PLOTLY_CDN) {}
                    style {
                        "body { font-family: sans-serif; margin: 2em auto; max-width: 1100px; color: #222; }
                        header { display: flex; align-items: center; gap: 1em; border-bottom: 2px solid #ccc; }
                        header img { height: 48px; }
                        section { margin-top: 2em; }
                        table { border-collapse: collapse; }
                        td, th { border: 1px solid #ccc; padding: 4px 10px; text-align: right; }
                        footer { margin-top: 3em; font-size: 0.8em; color: #777; }"
                    }
                }
                body {
                    header {
                        @if let Some(logo) = &self.logo {
                            img src=(logo) alt="logo";
                        }
                        h1 { (self.title) }
                    }
                    @for section in &self.sections {
                        (section.render())
                    }
                    footer {
                        "Generated by " (self.software_name) " v" (self.version) " on " (generated)
                    }
                }
            }
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        fs::write(path.as_ref(), self.render().into_string())?;
        log::info!("Report saved to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_render_in_order() {
        let mut report = Report::new("cervirisk", "0.1.0", None, "Training Report");
        let mut first = ReportSection::new("Metrics");
        first.add_content(html! { p { "accuracy" } });
        report.add_section(first);
        report.add_section(ReportSection::new("Configuration"));

        let page = report.render().into_string();
        let metrics = page.find("Metrics").unwrap();
        let config = page.find("Configuration").unwrap();
        assert!(metrics < config);
        assert!(page.contains("accuracy"));
        assert!(page.contains("cervirisk v0.1.0"));
    }
}
