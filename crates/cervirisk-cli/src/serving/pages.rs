use axum::response::Html;
use maud::{html, Markup, PreEscaped, DOCTYPE};

/// Risk-form inputs: (request field, input id, label).
const FORM_FIELDS: &[(&str, &str, &str)] = &[
    ("Age", "age", "Age"),
    ("Smokes", "smokes", "Smokes (0 = no, 1 = yes)"),
    ("Smokes (years)", "smoking-years", "Years smoking"),
    ("Smokes (packs/year)", "packs-per-year", "Packs per year"),
    ("Number of sexual partners", "partners", "Number of sexual partners"),
    ("First sexual intercourse", "first-intercourse", "Age at first sexual intercourse"),
    ("Num of pregnancies", "pregnancies", "Number of pregnancies"),
    ("Hormonal Contraceptives", "contraceptive-use", "Hormonal contraceptives (0/1)"),
    ("Hormonal Contraceptives (years)", "contraceptive-duration", "Hormonal contraceptives (years)"),
    ("IUD", "iud-use", "IUD (0/1)"),
    ("IUD (years)", "iud-duration", "IUD (years)"),
    ("STDs", "stds", "STDs (0/1)"),
    ("STDs (number)", "stds-number", "Number of STDs"),
    ("STDs: Number of diagnosis", "stds-diagnosis-number", "Number of STD diagnoses"),
    ("STDs: Time since first diagnosis", "stds-first-diagnosis", "Years since first STD diagnosis"),
    ("STDs: Time since last diagnosis", "stds-last-diagnosis", "Years since last STD diagnosis"),
    ("STDs:condylomatosis", "stds-condylomatosis", "Condylomatosis (0/1)"),
    ("STDs:cervical condylomatosis", "stds-cervical-condylomatosis", "Cervical condylomatosis (0/1)"),
    ("STDs:vaginal condylomatosis", "stds-vaginal-condylomatosis", "Vaginal condylomatosis (0/1)"),
    ("Dx:CIN", "dx-cin", "Previous CIN diagnosis (0/1)"),
    ("Dx:HPV", "dx-hpv", "Previous HPV diagnosis (0/1)"),
];

// Empty inputs are left out of the request so the server falls back to the
// training median for them.
const FORM_SCRIPT: &str = r#"
document.getElementById("cervical-form").addEventListener("submit", async function (e) {
    e.preventDefault();
    const payload = {};
    for (const input of this.querySelectorAll("input[data-feature]")) {
        if (input.value.trim() !== "") {
            payload[input.dataset.feature] = input.value;
        }
    }
    const result = document.getElementById("prediction-result");
    try {
        const response = await fetch("/predict", {
            method: "POST",
            headers: { "Content-Type": "application/json" },
            body: JSON.stringify(payload),
        });
        const body = await response.json();
        if (!response.ok) {
            result.innerHTML = `<p class="error">Error: ${body.error}</p>`;
            return;
        }
        result.innerHTML = `<p><strong>Prediction:</strong> ${body.prediction}</p>
            <p><strong>Probability:</strong> ${body.probability}%</p>`;
    } catch (err) {
        result.innerHTML = `<p class="error">Error: ${err}</p>`;
    }
});
"#;

const STYLE: &str = "
body { font-family: sans-serif; margin: 0; background: #faf7fb; color: #222; }
header { background: #7b2d8e; color: white; padding: 1em 2em; }
main { max-width: 760px; margin: 2em auto; background: white; padding: 2em; border-radius: 8px; }
label { display: block; margin-top: 0.8em; font-size: 0.9em; }
input { width: 100%; padding: 6px; box-sizing: border-box; }
button { margin-top: 1.5em; padding: 8px 20px; background: #7b2d8e; color: white; border: 0; border-radius: 4px; }
.error { color: red; }
";

fn page(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                style { (PreEscaped(STYLE)) }
            }
            body {
                header { h1 { "Cervical Cancer Risk Assessment" } }
                main { (body) }
            }
        }
    }
}

pub fn render_login() -> Markup {
    page(
        "Sign in",
        html! {
            h2 { "Sign in" }
            form action="/home" method="get" {
                label for="username" { "Username" }
                input id="username" name="username" type="text" autocomplete="username";
                label for="password" { "Password" }
                input id="password" name="password" type="password" autocomplete="current-password";
                button type="submit" { "Continue" }
            }
        },
    )
}

pub fn render_home() -> Markup {
    page(
        "Risk assessment",
        html! {
            h2 { "Estimate your risk" }
            p { "Leave a field empty if you do not know the answer." }
            form id="cervical-form" {
                @for (feature, id, label) in FORM_FIELDS {
                    label for=(id) { (label) }
                    input id=(id) type="number" step="any" min="0" data-feature=(feature);
                }
                button type="submit" { "Predict" }
            }
            div id="prediction-result" {}
            script { (PreEscaped(FORM_SCRIPT)) }
        },
    )
}

/// `GET /`
pub async fn login() -> Html<String> {
    Html(render_login().into_string())
}

/// `GET /home`
pub async fn home() -> Html<String> {
    Html(render_home().into_string())
}
