use rdcorpus_riksdag::clean::clean_fragment;
use rdcorpus_riksdag::sanitize::sanitize;

/// Word-processor style fragment: page divs, tables, inline formatting.
fn synthetic_fragment(pages: usize) -> String {
    let mut html = String::new();
    for page in 1..=pages {
        html.push_str(&format!("<div id=\"page_{page}\"><div class=\"pageWrap\">"));
        html.push_str("<h2 style=\"x\">Rubrik<![if !supportEmptyParas]>&nbsp;<![endif]></h2>");
        for para in 0..20 {
            html.push_str(&format!(
                "<p class=\"MsoNormal\"><span lang=\"SV\">Stycke {para} med <b>fet</b> och \
                 <i>kursiv</i> text,<br>radbrytning och mjuk\u{AD}avstavning.</span></p>"
            ));
        }
        html.push_str("<table><tr><td>Ja</td><td>150</td></tr><tr><td>Nej</td><td>130</td></tr></table>");
        html.push_str("</div></div>");
    }
    html
}

#[divan::bench(args = [1, 10, 50])]
fn clean(bencher: divan::Bencher, pages: usize) {
    let html = synthetic_fragment(pages);
    bencher.bench(|| clean_fragment(divan::black_box(&html)));
}

#[divan::bench(args = [1, 10, 50])]
fn clean_and_sanitize(bencher: divan::Bencher, pages: usize) {
    let html = synthetic_fragment(pages);
    bencher.bench(|| {
        let cleaned = clean_fragment(&html);
        sanitize(divan::black_box(&cleaned), "bench.xml", false)
    });
}

fn main() {
    divan::main();
}
