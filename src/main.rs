//! Remnant Sheet entry point
//!
//! wasm32: binds the form in `index.html` to a sheet controller backed by
//! LocalStorage. Native: a small CLI over a JSON store file.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;

    use gloo_timers::callback::Timeout;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        Document, Element, Event, FileReader, HtmlButtonElement, HtmlElement, HtmlImageElement,
        HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement,
    };

    use remnant_sheet::error::StoreError;
    use remnant_sheet::image::is_image_data_uri;
    use remnant_sheet::persistence::LocalStore;
    use remnant_sheet::record::{NUMERIC_FIELD_NAMES, STRESS_BOXES};
    use remnant_sheet::validation::ALLOCATION_RULE;
    use remnant_sheet::{
        CharacterRecord, FieldChange, KeyValueStore, MemoryStore, Quadrant, SheetConfig,
        SheetController, SheetIdentity, TextField, open_sheets,
    };

    /// LocalStorage, or a session-only map when the browser refuses it
    enum BrowserStore {
        Local(LocalStore),
        Session(MemoryStore),
    }

    impl KeyValueStore for BrowserStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            match self {
                BrowserStore::Local(s) => s.get(key),
                BrowserStore::Session(s) => s.get(key),
            }
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            match self {
                BrowserStore::Local(s) => s.set(key, value),
                BrowserStore::Session(s) => s.set(key, value),
            }
        }

        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            match self {
                BrowserStore::Local(s) => s.remove(key),
                BrowserStore::Session(s) => s.remove(key),
            }
        }
    }

    /// Editor instance holding all state
    struct App {
        controller: SheetController<BrowserStore>,
        /// Pending autosave poll; replacing it cancels the previous one
        autosave_timer: Option<Timeout>,
    }

    type Shared = Rc<RefCell<App>>;

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn element_value(el: &Element) -> Option<String> {
        if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
            return Some(input.value());
        }
        if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
            return Some(area.value());
        }
        el.dyn_ref::<HtmlSelectElement>().map(|select| select.value())
    }

    fn set_element_value(el: &Element, value: &str) {
        if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
            if input.value() != value {
                input.set_value(value);
            }
        } else if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
            if area.value() != value {
                area.set_value(value);
            }
        } else if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        }
    }

    fn escape_html(s: &str) -> String {
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;")
    }

    // === Rendering ===

    fn render_record(document: &Document, record: &CharacterRecord) {
        for field in TextField::PLAIN
            .into_iter()
            .chain(Quadrant::ALL.into_iter().map(TextField::Aspect))
        {
            if let Some(el) = document.get_element_by_id(field.key()) {
                set_element_value(&el, record.text(field));
            }
        }

        for key in NUMERIC_FIELD_NAMES {
            if let (Some(el), Some(field)) = (
                document.get_element_by_id(key),
                remnant_sheet::NumericField::from_key(key),
            ) {
                set_element_value(&el, &record.numeric(field).to_string());
            }
        }

        for quadrant in Quadrant::ALL {
            render_stress(document, quadrant, record);
        }

        render_portrait(document, record.character_image.as_deref());
    }

    fn render_stress(document: &Document, quadrant: Quadrant, record: &CharacterRecord) {
        let track = record.stress(quadrant);
        for (index, stressed) in track.iter().enumerate() {
            let id = format!("{}-{}", quadrant.stress_key(), index);
            if let Some(el) = document.get_element_by_id(&id) {
                let class = if *stressed {
                    "stress-box stressed"
                } else {
                    "stress-box"
                };
                el.set_attribute("class", class).ok();
            }
        }
    }

    fn render_portrait(document: &Document, image: Option<&str>) {
        if let Some(img) = document
            .get_element_by_id("portrait")
            .and_then(|el| el.dyn_into::<HtmlImageElement>().ok())
        {
            match image {
                Some(src) => {
                    img.set_src(src);
                    img.set_hidden(false);
                }
                None => {
                    img.remove_attribute("src").ok();
                    img.set_hidden(true);
                }
            }
        }
        if let Some(el) = document
            .get_element_by_id("portrait-placeholder")
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        {
            el.set_hidden(image.is_some());
        }
    }

    fn render_banner(document: &Document, valid: bool) {
        if let Some(el) = document.get_element_by_id("allocation-rule") {
            if valid {
                el.set_attribute("class", "hidden").ok();
            } else {
                el.set_text_content(Some(ALLOCATION_RULE));
                el.set_attribute("class", "allocation-rule").ok();
            }
        }
    }

    fn render_identity(document: &Document, identity: SheetIdentity<'_>) {
        let label = match identity {
            SheetIdentity::Draft => "Unsaved sheet".to_string(),
            SheetIdentity::Named(name) => name.to_string(),
        };
        if let Some(el) = document.get_element_by_id("current-sheet-name") {
            el.set_text_content(Some(&label));
        }
        if let Some(btn) = document
            .get_element_by_id("save-btn")
            .and_then(|el| el.dyn_into::<HtmlButtonElement>().ok())
        {
            btn.set_disabled(identity == SheetIdentity::Draft);
        }
    }

    fn render_sheet_list(document: &Document, names: &[&str]) {
        let Some(list) = document.get_element_by_id("sheet-list") else {
            return;
        };
        if names.is_empty() {
            list.set_inner_html("<li class=\"empty\">No saved sheets</li>");
            return;
        }
        let html: String = names
            .iter()
            .map(|name| {
                let name = escape_html(name);
                format!(
                    "<li><button data-action=\"load\" data-name=\"{name}\">{name}</button>\
                     <button data-action=\"delete\" data-name=\"{name}\" class=\"delete\">Delete</button></li>"
                )
            })
            .collect();
        list.set_inner_html(&html);
    }

    /// Everything that depends on more than a single field
    fn render_status(document: &Document, app: &App) {
        let c = &app.controller;
        render_banner(document, c.allocation_valid());
        render_identity(document, c.identity());
        render_sheet_list(document, &c.saved_names());
    }

    fn render_all(app: &App) {
        if let Some(document) = document() {
            render_record(&document, app.controller.record());
            render_status(&document, app);
        }
    }

    // === Edits and autosave ===

    fn apply(app: &Shared, change: FieldChange) {
        let now = js_sys::Date::now();
        {
            let mut a = app.borrow_mut();
            if !a.controller.apply_change(change, now) {
                return;
            }
        }
        arm_autosave(app, now);
        let a = app.borrow();
        if let Some(document) = document() {
            // Text inputs already show their value; refresh derived state and
            // anything the change may have clamped
            render_record(&document, a.controller.record());
            render_status(&document, &a);
        }
    }

    /// Replace the pending timer with one that fires when the debounce is
    /// due. Only the last timer of a burst survives to fire.
    fn arm_autosave(app: &Shared, now: f64) {
        let delay = app
            .borrow()
            .controller
            .autosave_remaining(now)
            .unwrap_or_default();
        let shared = app.clone();
        let timer = Timeout::new(delay.ceil() as u32, move || {
            shared.borrow_mut().controller.flush_autosave();
        });
        app.borrow_mut().autosave_timer = Some(timer);
    }

    // === Wiring ===

    fn listen<E, F>(target: &Element, event: &str, handler: F)
    where
        E: wasm_bindgen::convert::FromWasmAbi + 'static,
        F: FnMut(E) + 'static,
    {
        let closure = Closure::<dyn FnMut(E)>::new(handler);
        target
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .ok();
        closure.forget();
    }

    fn setup_fields(document: &Document, app: &Shared) {
        // Text fields and numeric selects share the name/value shape
        let keys = TextField::PLAIN
            .into_iter()
            .map(|f| (f.key(), "input"))
            .chain(Quadrant::ALL.into_iter().map(|q| (q.aspect_key(), "input")))
            .chain(NUMERIC_FIELD_NAMES.into_iter().map(|k| (k, "change")));

        for (key, event) in keys {
            let Some(el) = document.get_element_by_id(key) else {
                log::warn!("Form field #{} missing", key);
                continue;
            };
            let app = app.clone();
            let source = el.clone();
            listen(&el, event, move |_event: Event| {
                if let Some(change) =
                    element_value(&source).and_then(|v| FieldChange::from_name_value(key, &v))
                {
                    apply(&app, change);
                }
            });
        }

        for quadrant in Quadrant::ALL {
            for index in 0..STRESS_BOXES {
                let id = format!("{}-{}", quadrant.stress_key(), index);
                if let Some(el) = document.get_element_by_id(&id) {
                    let app = app.clone();
                    listen(&el, "click", move |_event: Event| {
                        apply(&app, FieldChange::StressToggle(quadrant, index));
                    });
                }
            }
        }
    }

    fn setup_portrait(document: &Document, app: &Shared) {
        let Some(input) = document
            .get_element_by_id("image-upload")
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        else {
            return;
        };
        let app = app.clone();
        let source = input.clone();
        listen(&input, "change", move |_event: Event| {
            let Some(file) = source.files().and_then(|files| files.get(0)) else {
                return;
            };
            if !file.type_().starts_with("image/") {
                log::warn!("Ignoring non-image portrait ({})", file.type_());
                return;
            }
            let Ok(reader) = FileReader::new() else {
                return;
            };
            let app = app.clone();
            let done = reader.clone();
            let onload = Closure::once(move |_event: Event| {
                let uri = done.result().ok().and_then(|v| v.as_string());
                match uri {
                    Some(uri) if is_image_data_uri(&uri) => {
                        apply(&app, FieldChange::Image(Some(uri)));
                    }
                    _ => log::warn!("Portrait could not be read"),
                }
            });
            reader.set_onloadend(Some(onload.as_ref().unchecked_ref()));
            onload.forget();
            if let Err(e) = reader.read_as_data_url(&file) {
                log::warn!("Portrait read failed: {:?}", e);
            }
        });
    }

    fn setup_sheet_buttons(document: &Document, app: &Shared) {
        // Save As: prompt for a name; cancel or blank does nothing
        if let Some(btn) = document.get_element_by_id("save-as-btn") {
            let app = app.clone();
            listen(&btn, "click", move |_event: Event| {
                let Some(window) = web_sys::window() else {
                    return;
                };
                let suggested = app.borrow().controller.record().character_name.clone();
                if let Ok(Some(name)) =
                    window.prompt_with_message_and_default("Save sheet as:", &suggested)
                {
                    let mut a = app.borrow_mut();
                    if a.controller.save_as(&name) {
                        drop(a);
                        render_all(&app.borrow());
                    }
                }
            });
        }

        // Save: overwrite the open named sheet
        if let Some(btn) = document.get_element_by_id("save-btn") {
            let app = app.clone();
            listen(&btn, "click", move |_event: Event| {
                let saved = app.borrow_mut().controller.overwrite();
                if saved {
                    render_all(&app.borrow());
                }
            });
        }

        // Load/Delete buttons are rendered into the list; one delegated handler
        if let Some(list) = document.get_element_by_id("sheet-list") {
            let app = app.clone();
            listen(&list, "click", move |event: Event| {
                let Some(button) = event
                    .target()
                    .and_then(|t| t.dyn_into::<Element>().ok())
                    .and_then(|el| el.closest("[data-action]").ok().flatten())
                else {
                    return;
                };
                let (Some(action), Some(name)) =
                    (button.get_attribute("data-action"), button.get_attribute("data-name"))
                else {
                    return;
                };
                match action.as_str() {
                    "load" => {
                        let loaded = app.borrow_mut().controller.load(&name);
                        if loaded {
                            app.borrow_mut().autosave_timer = None;
                            render_all(&app.borrow());
                        }
                    }
                    "delete" => {
                        let confirmed = web_sys::window()
                            .and_then(|w| {
                                w.confirm_with_message(&format!("Delete sheet \"{}\"?", name)).ok()
                            })
                            .unwrap_or(false);
                        if confirmed {
                            app.borrow_mut().controller.delete(&name);
                            render_all(&app.borrow());
                        }
                    }
                    _ => {}
                }
            });
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Remnant Sheet starting...");

        let document = document().ok_or_else(|| JsValue::from_str("no document"))?;

        let store = match LocalStore::open() {
            Ok(store) => BrowserStore::Local(store),
            Err(e) => {
                log::warn!("{}; sheets will not persist", e);
                BrowserStore::Session(MemoryStore::new())
            }
        };
        let app = Rc::new(RefCell::new(App {
            controller: open_sheets(store, &SheetConfig::default()),
            autosave_timer: None,
        }));

        setup_fields(&document, &app);
        setup_portrait(&document, &app);
        setup_sheet_buttons(&document, &app);
        render_all(&app.borrow());

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            loading.set_attribute("class", "hidden").ok();
        }

        log::info!("Remnant Sheet ready");
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_app::run()
}

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::fs;
    use std::path::{Path, PathBuf};

    use clap::{Parser, Subcommand};
    use thiserror::Error;

    use remnant_sheet::image::{decode_data_uri, encode_data_uri, mime_for_extension};
    use remnant_sheet::persistence::FileStore;
    use remnant_sheet::validation::{ALLOCATION_RULE, summarize};
    use remnant_sheet::{
        CharacterRecord, FieldChange, ImageError, Quadrant, SheetConfig, SheetController,
        open_sheets,
    };

    #[derive(Debug, Parser)]
    #[command(name = "remnant-sheet", version, about = "Legacy of the Remnant character sheets")]
    pub struct Cli {
        /// JSON file holding the current sheet and saved sheets
        #[arg(long, env = "REMNANT_SHEET_STORE", default_value = "remnant_sheets.json")]
        store: PathBuf,

        /// Optional JSON config (storage keys, autosave delay)
        #[arg(long, env = "REMNANT_SHEET_CONFIG")]
        config: Option<PathBuf>,

        #[command(subcommand)]
        command: Command,
    }

    #[derive(Debug, Subcommand)]
    enum Command {
        /// Print a sheet as JSON (the current sheet when no name is given)
        Show { name: Option<String> },
        /// List saved sheet names
        List,
        /// Check the skill allocation rule
        Check { name: Option<String> },
        /// Set a field on the current sheet (e.g. `set Heart 3`, `set notes "..."`)
        Set { field: String, value: String },
        /// Flip one stress box (index 0-2) on the current sheet
        Toggle { quadrant: String, index: usize },
        /// Set the current sheet's portrait from an image file, or clear it
        Portrait { path: Option<PathBuf> },
        /// Write a sheet's portrait to an image file
        ExportPortrait {
            path: PathBuf,
            #[arg(long)]
            name: Option<String>,
        },
        /// Save the current sheet under a name
        SaveAs { name: String },
        /// Copy a saved sheet into the current sheet
        Load { name: String },
        /// Delete a saved sheet
        Delete { name: String },
    }

    #[derive(Debug, Error)]
    pub enum CliError {
        #[error("unknown field or malformed value: {0}")]
        UnknownField(String),
        #[error("unknown quadrant: {0}")]
        UnknownQuadrant(String),
        #[error("stress box {0} out of range (0-2)")]
        StressIndex(usize),
        #[error("no saved sheet named '{0}'")]
        NoSuchSheet(String),
        #[error("sheet name must not be blank")]
        BlankName,
        #[error("sheet '{0}' could not be written to the store")]
        NotSaved(String),
        #[error("sheet has no portrait")]
        NoPortrait,
        #[error("portrait has no file extension: {}", .0.display())]
        NoExtension(PathBuf),
        #[error("io error: {0}")]
        Io(#[from] std::io::Error),
        #[error("json error: {0}")]
        Json(#[from] serde_json::Error),
        #[error(transparent)]
        Image(#[from] ImageError),
    }

    fn load_config(path: Option<&Path>) -> Result<SheetConfig, CliError> {
        match path {
            Some(path) => Ok(SheetConfig::from_json(&fs::read_to_string(path)?)?),
            None => Ok(SheetConfig::default()),
        }
    }

    fn portrait_uri(path: &Path) -> Result<String, CliError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| CliError::NoExtension(path.to_path_buf()))?;
        let mime = mime_for_extension(ext)?;
        Ok(encode_data_uri(mime, &fs::read(path)?))
    }

    fn sheet<'a>(
        sheets: &'a SheetController<FileStore>,
        name: Option<&str>,
    ) -> Result<&'a CharacterRecord, CliError> {
        match name {
            Some(name) => sheets
                .collection()
                .get(name)
                .ok_or_else(|| CliError::NoSuchSheet(name.to_string())),
            None => Ok(sheets.record()),
        }
    }

    fn edit(sheets: &mut SheetController<FileStore>, change: FieldChange) {
        sheets.apply_change(change, 0.0);
    }

    pub fn run(cli: Cli) -> Result<(), CliError> {
        let config = load_config(cli.config.as_deref())?;
        let mut sheets = open_sheets(FileStore::open(&cli.store), &config);

        match cli.command {
            Command::Show { name } => {
                let record = sheet(&sheets, name.as_deref())?;
                println!("{}", serde_json::to_string_pretty(record)?);
            }
            Command::List => {
                for name in sheets.saved_names() {
                    println!("{}", name);
                }
            }
            Command::Check { name } => {
                let record = sheet(&sheets, name.as_deref())?;
                let scores = record.skill_scores();
                let summary = summarize(&scores);
                for q in Quadrant::ALL {
                    println!("{:<9} +{}", q.as_str(), record.skill(q));
                }
                if summary.is_valid() {
                    println!("Allocation OK");
                } else {
                    println!("{} (total {})", ALLOCATION_RULE, summary.total);
                }
            }
            Command::Set { field, value } => {
                let change = FieldChange::from_name_value(&field, &value)
                    .ok_or(CliError::UnknownField(field))?;
                edit(&mut sheets, change);
            }
            Command::Toggle { quadrant, index } => {
                let q = Quadrant::from_str(&quadrant)
                    .ok_or(CliError::UnknownQuadrant(quadrant))?;
                if index >= remnant_sheet::record::STRESS_BOXES {
                    return Err(CliError::StressIndex(index));
                }
                edit(&mut sheets, FieldChange::StressToggle(q, index));
                println!("{:?}", sheets.record().stress(q));
            }
            Command::Portrait { path } => {
                let image = path.as_deref().map(portrait_uri).transpose()?;
                edit(&mut sheets, FieldChange::Image(image));
            }
            Command::ExportPortrait { path, name } => {
                let record = sheet(&sheets, name.as_deref())?;
                let uri = record.character_image.as_deref().ok_or(CliError::NoPortrait)?;
                let image = decode_data_uri(uri)?;
                fs::write(&path, &image.bytes)?;
                println!(
                    "Wrote {} ({} bytes) to {}",
                    image.mime,
                    image.bytes.len(),
                    path.display()
                );
            }
            Command::SaveAs { name } => {
                if !sheets.save_as(&name) {
                    return Err(CliError::BlankName);
                }
                // Store failures are swallowed; a missing entry means the write was dropped
                let name = name.trim();
                if !sheets.collection().contains_key(name) {
                    return Err(CliError::NotSaved(name.to_string()));
                }
                println!("Saved '{}'", name);
            }
            Command::Load { name } => {
                if !sheets.load(&name) {
                    return Err(CliError::NoSuchSheet(name));
                }
                println!("Loaded '{}'", name);
            }
            Command::Delete { name } => {
                if !sheets.delete(&name) {
                    return Err(CliError::NoSuchSheet(name));
                }
                println!("Deleted '{}'", name);
            }
        }

        sheets.flush_autosave();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;

    env_logger::init();
    log::info!("Remnant Sheet (native) starting...");

    if let Err(e) = cli::run(cli::Cli::parse()) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
