use crate::core::model::{ModuleReport, Report, Section};
use crate::core::plot::{self, Chart, LineData, PlotConfig, ScatterPoint, Stacking};
use crate::core::table::SampleTable;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::fmt::Write as FmtWrite;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

const WIDTH: f64 = 820.0;
const HEIGHT: f64 = 340.0;
const LEFT: f64 = 64.0;
const RIGHT: f64 = 20.0;
const TOP: f64 = 14.0;
const BOTTOM: f64 = 84.0;

const PALETTE: [&str; 10] = [
    "#7cb5ec", "#434348", "#90ed7d", "#f7a35c", "#8085e9", "#f15c80", "#e4d354", "#2b908f",
    "#f45b5b", "#91e8e1",
];

pub fn write(path: &Path, report: &Report) -> Result<()> {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let html = render(report, ts)?;
    let mut w = BufWriter::new(
        File::create(path).with_context(|| format!("create {} failed", path.display()))?,
    );
    w.write_all(html.as_bytes())?;
    w.flush()?;
    Ok(())
}

pub fn render(report: &Report, ts: u64) -> Result<String> {
    let mut html = String::with_capacity(128 * 1024);
    let title = escape_html(&report.title);

    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html lang=\"en\">")?;
    writeln!(html, "<head>")?;
    writeln!(html, "<meta charset=\"utf-8\"/>")?;
    writeln!(
        html,
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"/>"
    )?;
    writeln!(html, "<title>{}</title>", title)?;
    write_style(&mut html)?;
    writeln!(html, "</head>")?;
    writeln!(html, "<body>")?;

    writeln!(html, "<div class=\"page\">")?;
    writeln!(html, "<aside class=\"sidebar\">")?;
    writeln!(html, "<h2 id=\"summary\">Contents</h2>")?;
    writeln!(html, "<ul>")?;
    for module in report.populated() {
        sidebar_item(&mut html, module)?;
    }
    writeln!(html, "</ul>")?;
    writeln!(html, "</aside>")?;

    writeln!(html, "<main class=\"main\">")?;
    writeln!(html, "<h1>{}</h1>", title)?;
    writeln!(
        html,
        "<div class=\"meta\">Modules: {}<br/>Sections: {}<br/>Timestamp: {} (unix: {})</div>",
        report.populated().count(),
        report.section_count(),
        fmt_timestamp(ts),
        ts
    )?;
    if report.section_count() == 0 {
        writeln!(
            html,
            "<p class=\"desc\">No module found any input files.</p>"
        )?;
    }

    for module in report.populated() {
        module_header(&mut html, module)?;
        for section in &module.sections {
            section_header(&mut html, section)?;
            write_chart(&mut html, section)?;
            section_footer(&mut html)?;
        }
        writeln!(html, "</div>")?;
    }

    writeln!(html, "<div class=\"meta\">Produced by zqc</div>")?;
    writeln!(html, "</main>")?;
    writeln!(html, "</div>")?;
    html.push_str("<script>");
    html.push_str(r#"document.querySelectorAll('.cpswitch').forEach(g=>{const id=g.getAttribute('data-target');g.querySelectorAll('button').forEach(b=>{b.addEventListener('click',()=>{g.querySelectorAll('button').forEach(o=>o.classList.toggle('active',o===b));const show=b.getAttribute('data-show');['counts','pct'].forEach(v=>{const el=document.getElementById(id+'-'+v);if(el){el.hidden=(v!==show);}});});});});"#);
    html.push_str("</script>");
    writeln!(html, "</body></html>")?;
    Ok(html)
}

fn write_style(html: &mut String) -> Result<()> {
    writeln!(html, "<style>")?;
    writeln!(
        html,
        "body{{font-family:Arial,Helvetica,sans-serif;margin:0;background:#eee;color:#222;}}"
    )?;
    writeln!(
        html,
        ".page{{display:flex;align-items:flex-start;gap:16px;padding:16px;}}"
    )?;
    writeln!(
        html,
        ".sidebar{{width:260px;position:sticky;top:16px;align-self:flex-start;background:#f6f6f6;border:1px solid #ddd;border-radius:4px;padding:10px;}}"
    )?;
    writeln!(html, ".sidebar h2{{margin:4px 0 8px 0;font-size:16px;}}")?;
    writeln!(html, ".sidebar ul{{list-style:none;margin:0;padding:0;}}")?;
    writeln!(html, ".sidebar ul ul{{padding-left:14px;}}")?;
    writeln!(html, ".sidebar li{{padding:3px 0;font-size:13px;}}")?;
    writeln!(html, ".sidebar a{{color:#003366;text-decoration:none;}}")?;
    writeln!(html, ".sidebar a:hover{{text-decoration:underline;}}")?;
    writeln!(
        html,
        ".main{{flex:1;background:#fff;border:1px solid #ddd;border-radius:4px;box-shadow:0 1px 3px rgba(0,0,0,0.08);padding:16px 20px;}}"
    )?;
    writeln!(html, "h1{{margin:0 0 6px 0;font-size:22px;}}")?;
    writeln!(html, "h2{{margin:20px 0 6px 0;font-size:20px;}}")?;
    writeln!(html, "h3{{margin:16px 0 6px 0;font-size:16px;}}")?;
    writeln!(
        html,
        ".meta{{color:#555;font-size:12px;margin-bottom:12px;}}"
    )?;
    writeln!(
        html,
        ".module{{padding:8px 0 14px 0;border-bottom:1px solid #eee;}}"
    )?;
    writeln!(html, ".module:last-child{{border-bottom:none;}}")?;
    writeln!(html, ".plot{{margin:8px 0 6px 0;}}")?;
    writeln!(
        html,
        ".desc{{color:#444;font-size:13px;max-width:1000px;margin:4px 0 10px 0;}}"
    )?;
    writeln!(
        html,
        ".cpswitch button{{font-size:12px;padding:2px 8px;border:1px solid #bbb;background:#f6f6f6;cursor:pointer;}}"
    )?;
    writeln!(
        html,
        ".cpswitch button.active{{background:#3b6ea5;color:#fff;border-color:#2f5a86;}}"
    )?;
    writeln!(
        html,
        ".legend{{font-size:12px;display:flex;flex-wrap:wrap;gap:10px;max-width:820px;}}"
    )?;
    writeln!(
        html,
        ".swatch{{display:inline-block;width:10px;height:10px;margin-right:4px;}}"
    )?;
    writeln!(
        html,
        ".back{{font-size:12px;margin-top:6px;display:inline-block;}}"
    )?;
    writeln!(
        html,
        "section:target{{outline:2px solid #99c;outline-offset:4px;border-radius:4px;}}"
    )?;
    writeln!(html, "svg{{background:#fafafa;border:1px solid #e5e5e5;}}")?;
    writeln!(html, "</style>")?;
    Ok(())
}

fn sidebar_item(out: &mut String, module: &ModuleReport) -> Result<()> {
    writeln!(
        out,
        "<li><a href=\"#module-{}\">{}</a><ul>",
        module.info.anchor,
        escape_html(module.info.name)
    )?;
    for section in &module.sections {
        writeln!(
            out,
            "<li><a href=\"#{}\">{}</a></li>",
            escape_html(&section.anchor),
            escape_html(&section.name)
        )?;
    }
    writeln!(out, "</ul></li>")?;
    Ok(())
}

fn module_header(out: &mut String, module: &ModuleReport) -> Result<()> {
    let info = &module.info;
    writeln!(out, "<div class=\"module\" id=\"module-{}\">", info.anchor)?;
    writeln!(out, "<h2>{}</h2>", escape_html(info.name))?;
    if info.href.is_empty() {
        writeln!(out, "<p class=\"desc\">{}</p>", escape_html(info.info))?;
    } else {
        writeln!(
            out,
            "<p class=\"desc\"><a href=\"{}\">{}</a> {}</p>",
            escape_html(info.href),
            escape_html(info.name),
            escape_html(info.info)
        )?;
    }
    Ok(())
}

fn section_header(out: &mut String, section: &Section) -> Result<()> {
    writeln!(
        out,
        "<section id=\"{}\" class=\"chart-{}\">",
        escape_html(&section.anchor),
        section.chart.kind()
    )?;
    writeln!(out, "<h3>{}</h3>", escape_html(&section.name))?;
    Ok(())
}

fn section_footer(out: &mut String) -> Result<()> {
    writeln!(out, "<a class=\"back\" href=\"#summary\">Back to top</a>")?;
    writeln!(out, "</section>")?;
    Ok(())
}

fn write_chart(out: &mut String, section: &Section) -> Result<()> {
    if section.chart.is_empty() {
        writeln!(out, "<p class=\"desc\">No data.</p>")?;
        return Ok(());
    }
    let config = section.chart.config();
    if let Some(title) = &config.title {
        writeln!(out, "<p class=\"desc\"><b>{}</b></p>", escape_html(title))?;
    }
    match &section.chart {
        Chart::Bar { data, config } if config.cpswitch => {
            let id = escape_html(&section.anchor);
            writeln!(out, "<div class=\"cpswitch\" data-target=\"{}\">", id)?;
            writeln!(
                out,
                "<button data-show=\"counts\" class=\"active\">{}</button><button data-show=\"pct\">{}</button>",
                escape_html(&config.cpswitch_counts_label),
                escape_html(&config.cpswitch_percent_label)
            )?;
            writeln!(out, "</div>")?;
            writeln!(out, "<div id=\"{}-counts\">", id)?;
            svg_bar(out, data, config, false)?;
            writeln!(out, "</div>")?;
            writeln!(out, "<div id=\"{}-pct\" hidden>", id)?;
            svg_bar(out, data, config, true)?;
            writeln!(out, "</div>")?;
        }
        Chart::Bar { data, config } => svg_bar(out, data, config, false)?,
        Chart::Line { data, config } => svg_multi_line(out, data, config)?,
        Chart::Scatter { data, config } => svg_scatter(out, data, config)?,
    }
    Ok(())
}

fn plot_frame(out: &mut String) -> Result<(f64, f64)> {
    let plot_w = WIDTH - LEFT - RIGHT;
    let plot_h = HEIGHT - TOP - BOTTOM;
    writeln!(out, "<div class=\"plot\">")?;
    writeln!(
        out,
        "<svg width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">",
        WIDTH, HEIGHT, WIDTH, HEIGHT
    )?;
    writeln!(
        out,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#fff\" stroke=\"#ddd\"/>",
        LEFT, TOP, plot_w, plot_h
    )?;
    Ok((plot_w, plot_h))
}

/// One bar (or bar group) per sample.
///
/// Stacked bars pile positive values upwards and negative values downwards
/// from zero. With `percent` every sample is scaled to sum to 100.
fn svg_bar(out: &mut String, data: &SampleTable, config: &PlotConfig, percent: bool) -> Result<()> {
    let cats = if config.hide_zero_cats {
        plot::nonzero_categories(data)
    } else {
        plot::all_categories(data)
    };
    let rows: Vec<(&str, Vec<f64>)> = data
        .iter()
        .map(|(sample, labels)| {
            let mut values: Vec<f64> = cats
                .iter()
                .map(|c| labels.get(c).copied().unwrap_or(0.0))
                .collect();
            if percent {
                let total: f64 = values.iter().sum();
                if total != 0.0 {
                    values.iter_mut().for_each(|v| *v = *v / total * 100.0);
                }
            }
            (sample.as_str(), values)
        })
        .collect();

    let stacked = config.stacking == Stacking::Normal;
    let (mut lo, mut hi) = (0.0f64, 0.0f64);
    for (_, values) in &rows {
        if stacked {
            lo = lo.min(values.iter().filter(|v| **v < 0.0).sum());
            hi = hi.max(values.iter().filter(|v| **v > 0.0).sum());
        } else {
            lo = values.iter().copied().fold(lo, f64::min);
            hi = values.iter().copied().fold(hi, f64::max);
        }
    }
    let (y_min, y_max) = if percent && stacked {
        (0.0, 100.0)
    } else {
        value_range(lo, hi, config)
    };
    let suffix = if percent { "%" } else { config.tt_suffix.as_str() };

    let (plot_w, plot_h) = plot_frame(out)?;
    draw_y_axis_ticks(out, LEFT, TOP, plot_w, plot_h, y_min, y_max, 5)?;
    let y_label = if percent {
        config.cpswitch_percent_label.as_str()
    } else {
        config.ylab.as_deref().unwrap_or("")
    };
    draw_axis_labels(out, LEFT, TOP, plot_w, plot_h, config.xlab.as_deref().unwrap_or(""), y_label)?;

    let y_of = |v: f64| TOP + plot_h - (v - y_min) / (y_max - y_min) * plot_h;
    let zero = y_of(0.0_f64.clamp(y_min, y_max));
    let group_w = plot_w / rows.len().max(1) as f64;
    let bar_w = if stacked {
        group_w * 0.7
    } else {
        group_w * 0.8 / cats.len().max(1) as f64
    };

    for (i, (sample, values)) in rows.iter().enumerate() {
        let x0 = LEFT + i as f64 * group_w + group_w * if stacked { 0.15 } else { 0.1 };
        let (mut pos, mut neg) = (0.0f64, 0.0f64);
        for (j, v) in values.iter().enumerate() {
            if *v == 0.0 {
                continue;
            }
            let (a, b, x) = if stacked {
                let base = if *v > 0.0 { pos } else { neg };
                let top = base + v;
                if *v > 0.0 {
                    pos = top;
                } else {
                    neg = top;
                }
                (base, top, x0)
            } else {
                (0.0, *v, x0 + j as f64 * bar_w)
            };
            let (ya, yb) = (y_of(a.clamp(y_min, y_max)), y_of(b.clamp(y_min, y_max)));
            writeln!(
                out,
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"><title>{}: {}: {:.*}{}</title></rect>",
                x,
                ya.min(yb),
                bar_w.max(1.0),
                (ya - yb).abs(),
                color(j),
                escape_html(sample),
                escape_html(&cats[j]),
                config.decimal_places,
                v,
                escape_html(suffix)
            )?;
        }
        let cx = LEFT + (i as f64 + 0.5) * group_w;
        let cy = TOP + plot_h + 6.0;
        writeln!(
            out,
            "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"10\" fill=\"#444\" text-anchor=\"end\" transform=\"rotate(-40 {:.2} {:.2})\">{}</text>",
            cx,
            cy,
            cx,
            cy,
            escape_html(sample)
        )?;
    }
    if y_min < 0.0 {
        writeln!(
            out,
            "<line x1=\"{}\" y1=\"{:.2}\" x2=\"{}\" y2=\"{:.2}\" stroke=\"#888\"/>",
            LEFT,
            zero,
            LEFT + plot_w,
            zero
        )?;
    }
    writeln!(out, "</svg></div>")?;
    legend(out, cats.iter().map(String::as_str))?;
    Ok(())
}

fn svg_multi_line(out: &mut String, data: &LineData, config: &PlotConfig) -> Result<()> {
    let xs = || data.values().flat_map(|pts| pts.iter().map(|(x, _)| *x));
    let x_min = config
        .xmin
        .unwrap_or_else(|| xs().fold(f64::INFINITY, f64::min));
    let x_max = config
        .xmax
        .unwrap_or_else(|| xs().fold(f64::NEG_INFINITY, f64::max));
    let (x_min, x_max) = if x_min.is_finite() && x_max.is_finite() && x_max > x_min {
        (x_min, x_max)
    } else {
        (x_min.min(0.0), x_min.max(0.0) + 1.0)
    };
    let hi = data
        .values()
        .flat_map(|pts| pts.iter().map(|(_, y)| *y))
        .fold(0.0, f64::max);
    let (y_min, y_max) = value_range(0.0, hi, config);

    let (plot_w, plot_h) = plot_frame(out)?;
    draw_y_axis_ticks(out, LEFT, TOP, plot_w, plot_h, y_min, y_max, 5)?;
    draw_x_axis_ticks(out, LEFT, TOP, plot_w, plot_h, x_min, x_max, 6)?;
    draw_axis_labels(
        out,
        LEFT,
        TOP,
        plot_w,
        plot_h,
        config.xlab.as_deref().unwrap_or(""),
        config.ylab.as_deref().unwrap_or(""),
    )?;
    for (i, (name, points)) in data.iter().enumerate() {
        svg_line(
            out,
            name,
            points,
            (LEFT, TOP, plot_w, plot_h),
            (x_min, x_max),
            (y_min, y_max),
            color(i),
        )?;
    }
    writeln!(out, "</svg></div>")?;
    legend(out, data.keys().map(String::as_str))?;
    Ok(())
}

fn svg_scatter(
    out: &mut String,
    data: &IndexMap<String, ScatterPoint>,
    config: &PlotConfig,
) -> Result<()> {
    let (x_min, x_max) = match (config.xmin, config.xmax) {
        (Some(a), Some(b)) => (a, b),
        _ => auto_range(data.values().map(|p| p.x), f64::MIN, f64::MAX),
    };
    let (y_min, y_max) = match (config.ymin, config.ymax) {
        (Some(a), Some(b)) => (a, b),
        _ => auto_range(data.values().map(|p| p.y), f64::MIN, f64::MAX),
    };

    let (plot_w, plot_h) = plot_frame(out)?;
    draw_y_axis_ticks(out, LEFT, TOP, plot_w, plot_h, y_min, y_max, 5)?;
    draw_x_axis_ticks(out, LEFT, TOP, plot_w, plot_h, x_min, x_max, 6)?;
    draw_axis_labels(
        out,
        LEFT,
        TOP,
        plot_w,
        plot_h,
        config.xlab.as_deref().unwrap_or(""),
        config.ylab.as_deref().unwrap_or(""),
    )?;
    for (sample, p) in data {
        let cx = LEFT + (p.x - x_min) / (x_max - x_min) * plot_w;
        let cy = TOP + plot_h - (p.y - y_min) / (y_max - y_min) * plot_h;
        writeln!(
            out,
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"5\" fill=\"{}\"><title>{}: ({:.*}, {:.*})</title></circle>",
            cx,
            cy,
            p.color,
            escape_html(sample),
            config.decimal_places,
            p.x,
            config.decimal_places,
            p.y
        )?;
        writeln!(
            out,
            "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"10\" fill=\"#444\">{}</text>",
            cx + 7.0,
            cy - 4.0,
            escape_html(sample)
        )?;
    }
    writeln!(out, "</svg></div>")?;
    Ok(())
}

fn legend<'a>(out: &mut String, names: impl Iterator<Item = &'a str>) -> Result<()> {
    writeln!(out, "<div class=\"legend\">")?;
    for (i, name) in names.enumerate() {
        writeln!(
            out,
            "<span><span class=\"swatch\" style=\"background:{}\"></span>{}</span>",
            color(i),
            escape_html(name)
        )?;
    }
    writeln!(out, "</div>")?;
    Ok(())
}

fn color(i: usize) -> &'static str {
    PALETTE[i % PALETTE.len()]
}

/// Axis range covering `lo..hi`, widened to tick boundaries and then
/// constrained by the chart's explicit limits.
fn value_range(lo: f64, hi: f64, config: &PlotConfig) -> (f64, f64) {
    let (start, step, count) = nice_ticks(lo, hi.max(lo + 1e-9), 5);
    let mut y_min = config.ymin.unwrap_or(start);
    let mut y_max = config.ymax.unwrap_or(start + step * (count - 1) as f64);
    if let Some(floor) = config.yfloor {
        y_min = y_min.max(floor);
    }
    if let Some(ceiling) = config.yceiling {
        y_max = y_max.min(ceiling);
    }
    if y_max - y_min < 1e-9 {
        y_max = y_min + 1.0;
    }
    (y_min, y_max)
}

fn draw_y_axis_ticks(
    out: &mut String,
    left: f64,
    top: f64,
    plot_w: f64,
    plot_h: f64,
    min_y: f64,
    max_y: f64,
    ticks: usize,
) -> Result<()> {
    if ticks < 2 || (max_y - min_y).abs() < 1e-9 {
        return Ok(());
    }
    let (start, step, count) = nice_ticks(min_y, max_y, ticks);
    let eps = step * 1e-6;
    for i in 0..count {
        let v = start + step * i as f64;
        if v < min_y - eps || v > max_y + eps {
            continue;
        }
        let y = top + plot_h - ((v - min_y) / (max_y - min_y).max(1e-6)) * plot_h;
        writeln!(
            out,
            "<line x1=\"{}\" y1=\"{:.2}\" x2=\"{}\" y2=\"{:.2}\" stroke=\"#eee\"/>",
            left,
            y,
            left + plot_w,
            y
        )?;
        writeln!(
            out,
            "<text x=\"{}\" y=\"{:.2}\" font-size=\"10\" fill=\"#666\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>",
            left - 4.0,
            y,
            fmt_tick(v)
        )?;
    }
    Ok(())
}

fn draw_x_axis_ticks(
    out: &mut String,
    left: f64,
    top: f64,
    plot_w: f64,
    plot_h: f64,
    min_x: f64,
    max_x: f64,
    ticks: usize,
) -> Result<()> {
    if ticks < 2 || (max_x - min_x).abs() < 1e-9 {
        return Ok(());
    }
    let (start, step, count) = nice_ticks(min_x, max_x, ticks);
    let eps = step * 1e-6;
    for i in 0..count {
        let v = start + step * i as f64;
        if v < min_x - eps || v > max_x + eps {
            continue;
        }
        let x = left + ((v - min_x) / (max_x - min_x).max(1e-6)) * plot_w;
        writeln!(
            out,
            "<line x1=\"{:.2}\" y1=\"{}\" x2=\"{:.2}\" y2=\"{}\" stroke=\"#eee\"/>",
            x,
            top,
            x,
            top + plot_h
        )?;
        writeln!(
            out,
            "<text x=\"{:.2}\" y=\"{}\" font-size=\"10\" fill=\"#666\" text-anchor=\"middle\" dominant-baseline=\"hanging\">{}</text>",
            x,
            top + plot_h + 4.0,
            fmt_tick(v)
        )?;
    }
    Ok(())
}

fn draw_axis_labels(
    out: &mut String,
    left: f64,
    top: f64,
    plot_w: f64,
    plot_h: f64,
    x_label: &str,
    y_label: &str,
) -> Result<()> {
    let x = left + plot_w / 2.0;
    let y = top + plot_h + BOTTOM - 8.0;
    writeln!(
        out,
        "<text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"#444\" text-anchor=\"middle\">{}</text>",
        x,
        y,
        escape_html(x_label)
    )?;
    let yx = left - 44.0;
    let yy = top + plot_h / 2.0;
    writeln!(
        out,
        "<text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"#444\" text-anchor=\"middle\" transform=\"rotate(-90 {} {})\">{}</text>",
        yx,
        yy,
        yx,
        yy,
        escape_html(y_label)
    )?;
    Ok(())
}

fn svg_line(
    out: &mut String,
    name: &str,
    data: &[(f64, f64)],
    (left, top, plot_w, plot_h): (f64, f64, f64, f64),
    (x_min, x_max): (f64, f64),
    (min_y, max_y): (f64, f64),
    color: &str,
) -> Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    let x_range = (x_max - x_min).max(1e-9);
    let y_range = (max_y - min_y).max(1e-9);

    let mut path = String::new();
    for (i, (xv, yv)) in data.iter().enumerate() {
        let x = left + (*xv - x_min) / x_range * plot_w;
        let y = top + plot_h - ((*yv - min_y) / y_range * plot_h);
        if i == 0 {
            write!(path, "M {:.2} {:.2}", x, y)?;
        } else {
            write!(path, " L {:.2} {:.2}", x, y)?;
        }
    }
    writeln!(
        out,
        "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\"><title>{}</title></path>",
        path,
        color,
        escape_html(name)
    )?;
    Ok(())
}

fn fmt_tick(v: f64) -> String {
    if (v - v.round()).abs() < 0.001 {
        format!("{}", v.round() as i64)
    } else if v.abs() < 10.0 {
        format!("{:.2}", v)
    } else {
        format!("{:.1}", v)
    }
}

fn fmt_timestamp(ts: u64) -> String {
    let days = (ts / 86_400) as i64;
    let secs = (ts % 86_400) as u32;
    let hour = secs / 3_600;
    let min = (secs % 3_600) / 60;
    let sec = secs % 60;

    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = mp + if mp < 10 { 3 } else { -9 };
    let year = y + if m <= 2 { 1 } else { 0 };

    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
        year, m, d, hour, min, sec
    )
}

fn nice_ticks(min: f64, max: f64, ticks: usize) -> (f64, f64, usize) {
    let range = (max - min).abs().max(1e-9);
    let rough = range / (ticks as f64 - 1.0);
    let mag = 10f64.powf(rough.abs().log10().floor());
    let norm = rough / mag;
    let step = if norm <= 1.0 {
        1.0
    } else if norm <= 2.0 {
        2.0
    } else if norm <= 5.0 {
        5.0
    } else {
        10.0
    } * mag;
    let start = (min / step).floor() * step;
    let end = (max / step).ceil() * step;
    let count = ((end - start) / step).round() as usize + 1;
    (start, step, count)
}

fn auto_range<I: Iterator<Item = f64>>(values: I, min_bound: f64, max_bound: f64) -> (f64, f64) {
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for v in values {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }
    if !min_v.is_finite() || !max_v.is_finite() {
        return (-1.0, 1.0);
    }
    let span = (max_v - min_v).max(1e-6);
    let pad = (span * 0.1).max(0.5);
    let lo = (min_v - pad).max(min_bound);
    let hi = (max_v + pad).min(max_bound);
    if (hi - lo) < 1e-6 { (lo - 1.0, hi + 1.0) } else { (lo, hi) }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
