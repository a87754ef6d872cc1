//! 解析ボタンとリセットボタン
//!
//! 解析ボタンは画像未選択でも押せる（押すと選択を促す）。解析中だけ無効。
//! クリアは解析中でも押せる（実行中の結果は破棄される）。

use leptos::prelude::*;

#[component]
pub fn DetectActions<FA, FC>(
    is_busy: Signal<bool>,
    has_image: Signal<bool>,
    on_analyze: FA,
    on_clear: FC,
) -> impl IntoView
where
    FA: Fn(()) + 'static + Clone,
    FC: Fn(()) + 'static + Clone,
{
    view! {
        <div class="detect-actions">
            <button
                class="btn btn-primary"
                disabled=move || is_busy.get()
                on:click={
                    let on_analyze = on_analyze.clone();
                    move |_| on_analyze(())
                }
            >
                {move || if is_busy.get() { "Analyzing..." } else { "Analyze Leaf" }}
            </button>

            <button
                class="btn btn-secondary"
                disabled=move || !has_image.get()
                on:click={
                    let on_clear = on_clear.clone();
                    move |_| on_clear(())
                }
            >
                "Clear"
            </button>
        </div>
    }
}
